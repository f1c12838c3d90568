//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Every error body has the same shape:
//!
//! ```json
//! { "success": false, "message": "..." }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use gallery_core::{CartError, OrderError};

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, CredentialError};
use crate::services::cart::CartServiceError;
use crate::services::orders::OrderServiceError;
use crate::services::uploads::{FormError, UploadError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bearer credential missing, malformed, invalid or expired.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Wrong email or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the client.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Concurrent modification or duplicate.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) | Self::Credential(CredentialError::Signing(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Credential(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::EmptyCart => StatusCode::BAD_REQUEST,
        }
    }

    // Don't expose internal error details to clients
    fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Resource not found".to_string(),
            Self::Database(RepositoryError::Conflict(_)) => {
                "The resource was modified concurrently, please retry".to_string()
            }
            Self::Database(_)
            | Self::Internal(_)
            | Self::Credential(CredentialError::Signing(_)) => "Server error".to_string(),
            Self::Credential(CredentialError::Unauthenticated) => {
                "No token, authorization denied".to_string()
            }
            Self::Credential(_) => "Token is not valid".to_string(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::EmptyCart => "Cart is empty".to_string(),
            Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(json!({
            "success": false,
            "message": self.client_message(),
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::AccountInactive => Self::Forbidden("Account is inactive".to_string()),
            AuthError::UserAlreadyExists => Self::Validation("User already exists".to_string()),
            AuthError::InvalidEmail(_) => Self::Validation("Invalid email address".to_string()),
            AuthError::MissingField(_) | AuthError::WeakPassword(_) => {
                Self::Validation(capitalize(&err.to_string()))
            }
            AuthError::Repository(e) => Self::Database(e),
            AuthError::Token(e) => Self::Credential(e),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}

impl From<CartServiceError> for AppError {
    fn from(err: CartServiceError) -> Self {
        match err {
            CartServiceError::Cart(CartError::LineNotFound(_)) => {
                Self::NotFound("Item not found in cart".to_string())
            }
            CartServiceError::Cart(e) => Self::Validation(capitalize(&e.to_string())),
            CartServiceError::ArtworkNotFound(_) => Self::NotFound("Artwork not found".to_string()),
            CartServiceError::UnknownUser(_) => {
                Self::Credential(CredentialError::InvalidOrExpired)
            }
            CartServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OrderServiceError> for AppError {
    fn from(err: OrderServiceError) -> Self {
        match err {
            OrderServiceError::Order(OrderError::EmptyCart) => Self::EmptyCart,
            OrderServiceError::Order(e @ OrderError::IllegalTransition { .. }) => {
                Self::Validation(capitalize(&e.to_string()))
            }
            OrderServiceError::IncompleteAddress => Self::Validation(capitalize(&err.to_string())),
            OrderServiceError::NotFound(_) => Self::NotFound("Order not found".to_string()),
            OrderServiceError::Forbidden => Self::Forbidden("Not authorized".to_string()),
            OrderServiceError::UnknownUser(_) => {
                Self::Credential(CredentialError::InvalidOrExpired)
            }
            OrderServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(_) => Self::Internal(err.to_string()),
            UploadError::Form(e) => e.into(),
            UploadError::Multipart(_) | UploadError::TooLarge | UploadError::UnsupportedType => {
                Self::Validation(capitalize(&err.to_string()))
            }
        }
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        Self::Validation(capitalize(&err.to_string()))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        // Unparsable IDs cannot name an existing resource
        Self::NotFound("Resource not found".to_string())
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
