//! Checkout and order management.

use serde::Deserialize;
use thiserror::Error;

use gallery_core::{
    Address, NewOrder, Order, OrderError, OrderId, OrderStatus, PaymentMethod, UserId,
};

use super::auth::Identity;
use super::cart::CartLocks;
use crate::db::{CartStore, OrderStore, RepositoryError};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("shipping address needs a street, city and country")]
    IncompleteAddress,

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("not authorized to view this order")]
    Forbidden,

    /// The caller's account no longer exists.
    #[error("user {0} does not exist")]
    UnknownUser(UserId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Admin status change request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Order service over a combined cart and order store.
pub struct OrderService<'a, S> {
    store: S,
    locks: &'a CartLocks,
}

impl<'a, S> OrderService<'a, S>
where
    S: CartStore + OrderStore + Sync,
{
    #[must_use]
    pub const fn new(store: S, locks: &'a CartLocks) -> Self {
        Self { store, locks }
    }

    /// Turn the caller's cart into a pending order and empty the cart.
    ///
    /// Holds the caller's cart lock for the whole operation. The store writes
    /// the order and the emptied cart atomically.
    ///
    /// # Errors
    ///
    /// - `Order(EmptyCart)` if there is nothing to buy
    /// - `IncompleteAddress` if the address lacks street, city or country
    /// - `UnknownUser` if the caller's account was deleted
    /// - `Repository(Conflict)` if the cart changed underneath
    pub async fn checkout(
        &self,
        identity: Identity,
        request: Checkout,
    ) -> Result<Order, OrderServiceError> {
        let _guard = self.locks.acquire(identity.user_id).await;
        let cart = self
            .store
            .load_or_create(identity.user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => OrderServiceError::UnknownUser(identity.user_id),
                other => other.into(),
            })?;

        let draft = NewOrder::from_cart(
            &cart,
            request.shipping_address,
            request.payment_method,
            request.notes,
        )?;
        if !draft.shipping_address.is_shippable() {
            return Err(OrderServiceError::IncompleteAddress);
        }

        let order = self.store.place(draft, &cart).await?;
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total,
            lines = order.lines.len(),
            "Order placed"
        );
        Ok(order)
    }

    /// Orders visible to the caller: their own, or all of them for admins.
    ///
    /// # Errors
    ///
    /// Returns `Repository` on store failure.
    pub async fn list(&self, identity: Identity) -> Result<Vec<Order>, OrderServiceError> {
        let orders = if identity.is_admin() {
            self.store.list_all().await?
        } else {
            self.store.list_for_user(identity.user_id).await?
        };
        Ok(orders)
    }

    /// One order, if the caller owns it or is an admin.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist, `Forbidden` if it belongs to
    /// someone else.
    pub async fn get(&self, identity: Identity, id: OrderId) -> Result<Order, OrderServiceError> {
        let order = self
            .store
            .get(id)
            .await?
            .ok_or(OrderServiceError::NotFound(id))?;

        if order.user_id != identity.user_id && !identity.is_admin() {
            return Err(OrderServiceError::Forbidden);
        }
        Ok(order)
    }

    /// Move an order along its lifecycle. Callers must already be admins.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist, or
    /// `Order(IllegalTransition)` if the lifecycle forbids the change.
    pub async fn update_status(
        &self,
        id: OrderId,
        change: StatusChange,
    ) -> Result<Order, OrderServiceError> {
        let mut order = self
            .store
            .get(id)
            .await?
            .ok_or(OrderServiceError::NotFound(id))?;
        let from = order.status;

        order.transition(change.status, change.tracking_number)?;
        let order = self.store.update_status(&order, from).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderServiceError::NotFound(id),
            other => other.into(),
        })?;

        tracing::info!(order_id = %id, from = %from, to = %order.status, "Order status changed");
        Ok(order)
    }
}
