//! Exhibition route handlers.
//!
//! Status (`upcoming`, `current`, `past`) is computed against the request
//! time, never stored.

use axum::{
    Json,
    extract::{Multipart, State},
};
use chrono::Utc;
use tracing::instrument;

use gallery_core::ExhibitionId;

use super::{Message, PathId};
use crate::db::RepositoryError;
use crate::db::exhibitions::{ExhibitionRepository, Window};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Exhibition, ExhibitionDraft};
use crate::services::uploads::{ImageKind, read_form};
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Exhibition not found".to_string())
}

fn map_missing(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => not_found(),
        other => other.into(),
    }
}

async fn list(state: &AppState, window: Window) -> Result<Json<Vec<Exhibition>>> {
    let exhibitions = ExhibitionRepository::new(state.pool())
        .list(window, Utc::now())
        .await?;
    Ok(Json(exhibitions))
}

/// All exhibitions, latest start first.
///
/// GET /api/exhibitions
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Exhibition>>> {
    list(&state, Window::All).await
}

/// GET /api/exhibitions/current
#[instrument(skip_all)]
pub async fn current(State(state): State<AppState>) -> Result<Json<Vec<Exhibition>>> {
    list(&state, Window::Current).await
}

/// GET /api/exhibitions/upcoming
#[instrument(skip_all)]
pub async fn upcoming(State(state): State<AppState>) -> Result<Json<Vec<Exhibition>>> {
    list(&state, Window::Upcoming).await
}

/// GET /api/exhibitions/past
#[instrument(skip_all)]
pub async fn past(State(state): State<AppState>) -> Result<Json<Vec<Exhibition>>> {
    list(&state, Window::Past).await
}

/// One exhibition.
///
/// GET /api/exhibitions/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    PathId(id): PathId<ExhibitionId>,
) -> Result<Json<Exhibition>> {
    ExhibitionRepository::new(state.pool())
        .get(id, Utc::now())
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Create an exhibition. The image is optional.
///
/// POST /api/exhibitions
#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Json<Exhibition>> {
    let form = read_form(multipart).await?;
    let draft = ExhibitionDraft::from_form(&form.fields)?;

    let image = match &form.image {
        Some(image) => Some(state.images().save(ImageKind::Exhibition, image).await?),
        None => None,
    };

    match ExhibitionRepository::new(state.pool())
        .create(&draft, image.as_deref(), Utc::now())
        .await
    {
        Ok(exhibition) => {
            tracing::info!(exhibition_id = %exhibition.id, "Exhibition created");
            Ok(Json(exhibition))
        }
        Err(e) => {
            if let Some(path) = &image {
                state.images().remove(path).await;
            }
            Err(e.into())
        }
    }
}

/// Replace an exhibition's fields, and its image if a new one is uploaded.
///
/// PUT /api/exhibitions/{id}
#[instrument(skip_all, fields(admin_id = %admin.user_id, exhibition_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathId(id): PathId<ExhibitionId>,
    multipart: Multipart,
) -> Result<Json<Exhibition>> {
    let repo = ExhibitionRepository::new(state.pool());
    let now = Utc::now();
    let current = repo.get(id, now).await?.ok_or_else(not_found)?;

    let form = read_form(multipart).await?;
    let draft = ExhibitionDraft::from_form(&form.fields)?;

    let new_image = match &form.image {
        Some(image) => Some(state.images().save(ImageKind::Exhibition, image).await?),
        None => None,
    };

    match repo.update(id, &draft, new_image.as_deref(), now).await {
        Ok(exhibition) => {
            if let (Some(_), Some(old)) = (&new_image, &current.image) {
                state.images().remove(old).await;
            }
            tracing::info!("Exhibition updated");
            Ok(Json(exhibition))
        }
        Err(e) => {
            if let Some(path) = &new_image {
                state.images().remove(path).await;
            }
            Err(map_missing(e))
        }
    }
}

/// Delete an exhibition and its image.
///
/// DELETE /api/exhibitions/{id}
#[instrument(skip_all, fields(admin_id = %admin.user_id, exhibition_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathId(id): PathId<ExhibitionId>,
) -> Result<Json<Message>> {
    let image = ExhibitionRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(map_missing)?;

    if let Some(path) = image {
        state.images().remove(&path).await;
    }
    tracing::info!("Exhibition removed");
    Ok(Message::new("Exhibition removed"))
}
