//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

use super::token::CredentialError;

/// Errors that can occur during registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] gallery_core::EmailError),

    /// A required registration field was empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Wrong password or unknown email. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account has been deactivated.
    #[error("account is inactive")]
    AccountInactive,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Issuing the session token failed.
    #[error("token error: {0}")]
    Token(#[from] CredentialError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
