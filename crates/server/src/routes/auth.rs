//! Authentication route handlers.
//!
//! Registration and password login both answer with a bearer token for the
//! account; the token is then sent as `Authorization: Bearer <token>`.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::JsonBody;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response carrying a fresh token and the account it belongs to.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

/// Response carrying the caller's account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

fn token_response(state: &AppState, user: User) -> Result<Json<TokenResponse>> {
    let token = state.tokens().issue(user.id, user.role)?;
    Ok(Json(TokenResponse {
        success: true,
        token,
        user,
    }))
}

/// Create an account.
///
/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<Registration>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let user = AuthService::new(state.pool()).register(form).await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, token_response(&state, user)?))
}

/// Log in with email and password.
///
/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide email and password".to_string(),
        ));
    }

    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;
    tracing::info!(user_id = %user.id, "User logged in");

    token_response(&state, user)
}

/// The authenticated caller's account.
///
/// GET /api/auth/user
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn current_user(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<UserResponse>> {
    // Break-glass admin tokens may name no stored account
    let user = UserRepository::new(state.pool())
        .get_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}
