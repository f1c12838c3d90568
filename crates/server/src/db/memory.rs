//! In-memory implementation of the store traits.
//!
//! Mirrors the `PostgreSQL` repositories closely enough to exercise the cart
//! and checkout services without a database, including the version check on
//! every cart write.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use gallery_core::{
    ArtworkId, Cart, CartId, LineSnapshot, NewOrder, Order, OrderId, OrderStatus, UserId,
};

use super::{ArtworkLookup, CartStore, OrderStore, RepositoryError};

#[derive(Default)]
struct Inner {
    artworks: HashMap<ArtworkId, LineSnapshot>,
    carts: HashMap<UserId, Cart>,
    orders: Vec<Order>,
    deleted_users: HashSet<UserId>,
    next_cart_id: i32,
    next_order_id: i32,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a catalog entry.
    pub fn put_artwork(&self, id: i32, title: &str, price: Decimal) -> ArtworkId {
        let artwork_id = ArtworkId::new(id);
        self.lock().artworks.insert(
            artwork_id,
            LineSnapshot {
                artwork_id,
                title: title.to_owned(),
                price,
                image: format!("/uploads/artworks/{id}.png"),
            },
        );
        artwork_id
    }

    /// Remove a catalog entry.
    pub fn remove_artwork(&self, id: ArtworkId) {
        self.lock().artworks.remove(&id);
    }

    /// Delete a user's account data, as the `users` cascade does.
    pub fn delete_user(&self, user_id: UserId) {
        let mut inner = self.lock();
        inner.carts.remove(&user_id);
        inner.orders.retain(|o| o.user_id != user_id);
        inner.deleted_users.insert(user_id);
    }

    /// The stored cart for a user, if one was created.
    #[must_use]
    pub fn cart(&self, user_id: UserId) -> Option<Cart> {
        self.lock().carts.get(&user_id).cloned()
    }

    /// Every stored order, oldest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    fn check_version(stored: &Cart, incoming: &Cart) -> Result<(), RepositoryError> {
        if stored.version == incoming.version {
            Ok(())
        } else {
            Err(RepositoryError::Conflict(format!(
                "cart {} was modified concurrently",
                incoming.id
            )))
        }
    }
}

impl ArtworkLookup for MemoryStore {
    async fn snapshot(&self, id: ArtworkId) -> Result<Option<LineSnapshot>, RepositoryError> {
        Ok(self.lock().artworks.get(&id).cloned())
    }
}

impl CartStore for MemoryStore {
    async fn load_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut inner = self.lock();
        if inner.deleted_users.contains(&user_id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(cart) = inner.carts.get(&user_id) {
            return Ok(cart.clone());
        }

        inner.next_cart_id += 1;
        let cart = Cart::empty(CartId::new(inner.next_cart_id), user_id, Utc::now());
        inner.carts.insert(user_id, cart.clone());
        Ok(cart)
    }

    async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .carts
            .get_mut(&cart.user_id)
            .ok_or(RepositoryError::NotFound)?;
        Self::check_version(stored, cart)?;

        *stored = Cart {
            version: cart.version + 1,
            updated_at: Utc::now(),
            ..cart.clone()
        };
        Ok(stored.clone())
    }
}

impl OrderStore for MemoryStore {
    async fn place(&self, order: NewOrder, cart: &Cart) -> Result<Order, RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .carts
            .get_mut(&cart.user_id)
            .ok_or(RepositoryError::NotFound)?;
        Self::check_version(stored, cart)?;

        let mut emptied = Cart {
            version: cart.version + 1,
            updated_at: Utc::now(),
            ..cart.clone()
        };
        emptied.clear();
        *stored = emptied;

        inner.next_order_id += 1;
        let placed = Order::from_new(OrderId::new(inner.next_order_id), order, Utc::now());
        inner.orders.push(placed.clone());
        Ok(placed)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.lock().orders.iter().rev().cloned().collect())
    }

    async fn update_status(
        &self,
        order: &Order,
        expected: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::Conflict(format!(
                "order {} changed status concurrently",
                order.id
            )));
        }

        stored.status = order.status;
        stored.tracking_number.clone_from(&order.tracking_number);
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}
