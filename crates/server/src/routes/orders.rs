//! Order route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use gallery_core::{Order, OrderId};

use super::{JsonBody, PathId};
use crate::db::orders::OrderRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::services::orders::{Checkout, OrderService, StatusChange};
use crate::state::AppState;

fn service(state: &AppState) -> OrderService<'_, OrderRepository<'_>> {
    OrderService::new(OrderRepository::new(state.pool()), state.cart_locks())
}

/// Check out the caller's cart.
///
/// POST /api/orders
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    JsonBody(req): JsonBody<Checkout>,
) -> Result<Json<Order>> {
    Ok(Json(service(&state).checkout(identity, req).await?))
}

/// The caller's orders, or every order for an admin.
///
/// GET /api/orders
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(service(&state).list(identity).await?))
}

/// GET /api/orders/{id}
#[instrument(skip_all, fields(user_id = %identity.user_id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    PathId(id): PathId<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(service(&state).get(identity, id).await?))
}

/// Move an order along its lifecycle.
///
/// PUT /api/orders/{id}
#[instrument(skip_all, fields(admin_id = %admin.user_id, order_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathId(id): PathId<OrderId>,
    JsonBody(change): JsonBody<StatusChange>,
) -> Result<Json<Order>> {
    Ok(Json(service(&state).update_status(id, change).await?))
}
