//! Authentication extractors.
//!
//! Resolve the `Authorization` header to an [`Identity`] using the token
//! keys in [`AppState`]. Rejections are [`AppError`]s so they share the JSON
//! error body of every other failure.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{CredentialError, Identity};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(identity): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
pub struct RequireAuth(pub Identity);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| CredentialError::Malformed)?),
            None => None,
        };

        let identity = state.tokens().verify(header)?;

        Span::current().record("user_id", identity.user_id.as_i32());
        set_sentry_user(&identity.user_id);

        Ok(Self(identity))
    }
}

/// Extractor that requires a valid bearer token with the `admin` role.
///
/// Missing or invalid tokens are rejected as unauthenticated; valid tokens
/// for regular users are rejected as forbidden.
pub struct RequireAdmin(pub Identity);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(identity) = RequireAuth::from_request_parts(parts, state).await?;

        if !identity.is_admin() {
            tracing::warn!(user_id = %identity.user_id, path = %parts.uri.path(), "Admin route denied");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(Self(identity))
    }
}
