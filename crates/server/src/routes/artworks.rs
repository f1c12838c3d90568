//! Artwork catalog route handlers.
//!
//! Reads are public. Writes take `multipart/form-data` from an admin: text
//! fields for the artwork and an optional `image` file part.

use axum::{
    Json,
    extract::{Multipart, State},
};
use tracing::instrument;

use gallery_core::ArtworkId;

use super::{Message, PathId};
use crate::db::RepositoryError;
use crate::db::artworks::ArtworkRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Artwork, ArtworkDraft};
use crate::services::uploads::{FormError, ImageKind, read_form};
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Artwork not found".to_string())
}

/// All artworks, newest first.
///
/// GET /api/artworks
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Artwork>>> {
    Ok(Json(ArtworkRepository::new(state.pool()).list().await?))
}

/// Featured artworks.
///
/// GET /api/artworks/featured
#[instrument(skip_all)]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Artwork>>> {
    Ok(Json(ArtworkRepository::new(state.pool()).featured().await?))
}

/// One artwork.
///
/// GET /api/artworks/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    PathId(id): PathId<ArtworkId>,
) -> Result<Json<Artwork>> {
    ArtworkRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Create an artwork. An image is required.
///
/// POST /api/artworks
#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Json<Artwork>> {
    let form = read_form(multipart).await?;
    let draft = ArtworkDraft::from_form(&form.fields)?;
    let image = form.image.ok_or(FormError::Missing("image"))?;

    let path = state.images().save(ImageKind::Artwork, &image).await?;
    let created = ArtworkRepository::new(state.pool())
        .create(&draft, &path)
        .await;

    match created {
        Ok(artwork) => {
            tracing::info!(artwork_id = %artwork.id, "Artwork created");
            Ok(Json(artwork))
        }
        Err(e) => {
            state.images().remove(&path).await;
            Err(e.into())
        }
    }
}

/// Replace an artwork's fields, and its image if a new one is uploaded.
///
/// PUT /api/artworks/{id}
#[instrument(skip_all, fields(admin_id = %admin.user_id, artwork_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathId(id): PathId<ArtworkId>,
    multipart: Multipart,
) -> Result<Json<Artwork>> {
    let repo = ArtworkRepository::new(state.pool());
    let current = repo.get(id).await?.ok_or_else(not_found)?;

    let form = read_form(multipart).await?;
    let draft = ArtworkDraft::from_form(&form.fields)?;

    let new_image = match &form.image {
        Some(image) => Some(state.images().save(ImageKind::Artwork, image).await?),
        None => None,
    };

    match repo.update(id, &draft, new_image.as_deref()).await {
        Ok(artwork) => {
            if new_image.is_some() {
                state.images().remove(&current.image).await;
            }
            tracing::info!("Artwork updated");
            Ok(Json(artwork))
        }
        Err(e) => {
            if let Some(path) = &new_image {
                state.images().remove(path).await;
            }
            Err(match e {
                RepositoryError::NotFound => not_found(),
                other => other.into(),
            })
        }
    }
}

/// Delete an artwork and its image. Carts and orders keep their snapshots.
///
/// DELETE /api/artworks/{id}
#[instrument(skip_all, fields(admin_id = %admin.user_id, artwork_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathId(id): PathId<ArtworkId>,
) -> Result<Json<Message>> {
    let artwork = ArtworkRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => not_found(),
            other => other.into(),
        })?;

    state.images().remove(&artwork.image).await;
    tracing::info!("Artwork removed");
    Ok(Message::new("Artwork removed"))
}
