//! Authentication service.
//!
//! Password registration and login, plus the bearer token keys used to
//! verify every protected request.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{CredentialError, Identity, TokenKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use gallery_core::{Address, Email, Role};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user account with the `user` role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if name, email or password is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: Registration) -> Result<User, AuthError> {
        let new_user = prepare_registration(form, Role::User)?;
        self.create(&new_user).await
    }

    /// Create or promote an administrator account.
    ///
    /// Used by out-of-band provisioning; there is no HTTP route for it.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`Self::register`].
    pub async fn provision_admin(&self, form: Registration) -> Result<User, AuthError> {
        let new_user = prepare_registration(form, Role::Admin)?;

        match self.users.get_with_password_hash(&new_user.email).await? {
            Some((existing, _)) => Ok(self
                .users
                .promote_to_admin(existing.id, &new_user.password_hash)
                .await?),
            None => self.create(&new_user).await,
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountInactive` if the account was deactivated.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        // A malformed email cannot belong to anyone
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active() {
            return Err(AuthError::AccountInactive);
        }

        Ok(user)
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, AuthError> {
        self.users.create(new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
    }
}

/// Validate a registration form and hash its password.
fn prepare_registration(form: Registration, role: Role) -> Result<NewUser, AuthError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AuthError::MissingField("name"));
    }
    if form.email.trim().is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if form.password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }

    let email = Email::parse(&form.email)?;
    validate_password(&form.password)?;
    let password_hash = hash_password(&form.password)?;

    Ok(NewUser {
        name: name.to_owned(),
        email,
        password_hash,
        role,
        phone: form
            .phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty()),
        address: form.address.unwrap_or_default().normalized(),
    })
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
