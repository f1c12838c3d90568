//! Cart route handlers.
//!
//! Every handler acts on the caller's own cart; there is no way to address
//! another user's cart.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use gallery_core::{ArtworkId, Cart};

use super::{JsonBody, PathId};
use crate::db::artworks::ArtworkRepository;
use crate::db::carts::CartRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub artwork_id: ArtworkId,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: i64,
}

fn service(state: &AppState) -> CartService<'_, CartRepository<'_>, ArtworkRepository<'_>> {
    CartService::new(
        CartRepository::new(state.pool()),
        ArtworkRepository::new(state.pool()),
        state.cart_locks(),
    )
}

/// The caller's cart, created empty on first access.
///
/// GET /api/cart
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Cart>> {
    Ok(Json(service(&state).get(identity.user_id).await?))
}

/// Add an artwork, merging with an existing line.
///
/// POST /api/cart/add
#[instrument(skip_all, fields(user_id = %identity.user_id, artwork_id = %req.artwork_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    JsonBody(req): JsonBody<AddToCart>,
) -> Result<Json<Cart>> {
    let cart = service(&state)
        .add(identity.user_id, req.artwork_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// Set a line's quantity. Zero or less removes it.
///
/// PUT /api/cart/update/{artworkId}
#[instrument(skip_all, fields(user_id = %identity.user_id, artwork_id = %artwork_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    PathId(artwork_id): PathId<ArtworkId>,
    JsonBody(req): JsonBody<SetQuantity>,
) -> Result<Json<Cart>> {
    let cart = service(&state)
        .update(identity.user_id, artwork_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line.
///
/// DELETE /api/cart/remove/{artworkId}
#[instrument(skip_all, fields(user_id = %identity.user_id, artwork_id = %artwork_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    PathId(artwork_id): PathId<ArtworkId>,
) -> Result<Json<Cart>> {
    Ok(Json(service(&state).remove(identity.user_id, artwork_id).await?))
}

/// Empty the cart.
///
/// DELETE /api/cart/clear
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Cart>> {
    Ok(Json(service(&state).clear(identity.user_id).await?))
}
