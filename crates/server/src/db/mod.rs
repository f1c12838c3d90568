//! Database operations for the gallery `PostgreSQL` schema.
//!
//! # Schema: `gallery`
//!
//! ## Tables
//!
//! - `users` - Accounts, password hashes, roles and profile data
//! - `artworks` - Catalog entries
//! - `exhibitions` - Exhibition listings (status derived from dates)
//! - `carts` / `cart_items` - One cart per user with snapshotted lines
//! - `orders` / `order_items` - Immutable checkout snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p gallery-cli -- migrate
//! ```
//!
//! # Stores
//!
//! The cart and checkout flows only talk to persistence through the
//! [`ArtworkLookup`], [`CartStore`] and [`OrderStore`] traits. The `PostgreSQL`
//! repositories implement them for production; [`memory::MemoryStore`]
//! implements them for tests.

pub mod artworks;
pub mod carts;
pub mod exhibitions;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod orders;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use gallery_core::{
    ArtworkId, Cart, LineSnapshot, NewOrder, Order, OrderId, OrderStatus, UserId,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped back into a domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The row to update or delete does not exist.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation or stale write.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Read access to the artwork catalog, as needed by the cart.
pub trait ArtworkLookup {
    /// Current title, price and image of an artwork, or `None` if it does not exist.
    fn snapshot(
        &self,
        id: ArtworkId,
    ) -> impl Future<Output = Result<Option<LineSnapshot>, RepositoryError>> + Send;
}

/// Persistence for carts.
pub trait CartStore {
    /// Load the user's cart, inserting an empty one if none exists.
    ///
    /// Fails with `RepositoryError::NotFound` if the user does not exist.
    fn load_or_create(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Cart, RepositoryError>> + Send;

    /// Replace the stored lines and total of `cart`.
    ///
    /// The write only succeeds if the stored version still equals
    /// `cart.version`; the returned cart carries the bumped version. A stale
    /// version yields `RepositoryError::Conflict`.
    fn save(&self, cart: &Cart) -> impl Future<Output = Result<Cart, RepositoryError>> + Send;
}

/// Persistence for orders.
pub trait OrderStore {
    /// Insert `order` and empty `cart` atomically.
    ///
    /// Fails with `RepositoryError::Conflict` (and writes nothing) if the cart
    /// changed since it was loaded.
    fn place(
        &self,
        order: NewOrder,
        cart: &Cart,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Get an order by ID.
    fn get(&self, id: OrderId)
    -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Orders placed by one user, newest first.
    fn list_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// Every order, newest first.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// Persist the status and tracking number of an existing order.
    ///
    /// The write only applies while the stored status still equals
    /// `expected`. A changed status yields `RepositoryError::Conflict`, a
    /// missing order `RepositoryError::NotFound`.
    fn update_status(
        &self,
        order: &Order,
        expected: OrderStatus,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;
}
