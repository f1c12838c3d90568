//! User administration route handlers. Admin only.

use axum::{Json, extract::State};
use tracing::instrument;

use gallery_core::UserId;

use super::{JsonBody, Message, PathId};
use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{User, UserUpdate};
use crate::state::AppState;

fn map_missing(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("User not found".to_string()),
        other => other.into(),
    }
}

/// Every account, newest first.
///
/// GET /api/users
#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list().await?))
}

/// Change a user's profile, role or status.
///
/// PUT /api/users/{id}
#[instrument(skip_all, fields(admin_id = %admin.user_id, target_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathId(id): PathId<UserId>,
    JsonBody(changes): JsonBody<UserUpdate>,
) -> Result<Json<User>> {
    let repo = UserRepository::new(state.pool());
    let mut user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| map_missing(RepositoryError::NotFound))?;

    changes.apply(&mut user);
    let user = repo.update(&user).await.map_err(map_missing)?;

    tracing::info!(role = %user.role, status = ?user.status, "User updated");
    Ok(Json(user))
}

/// Delete a user together with their cart and orders.
///
/// DELETE /api/users/{id}
#[instrument(skip_all, fields(admin_id = %admin.user_id, target_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathId(id): PathId<UserId>,
) -> Result<Json<Message>> {
    UserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(map_missing)?;

    tracing::info!("User removed");
    Ok(Message::new("User removed"))
}
