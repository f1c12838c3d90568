//! Cart operations.
//!
//! Every mutation is a read-modify-write of the whole cart. Mutations for the
//! same user are serialized by a per-user async lock held across the load and
//! the save, and the store's version check rejects any write that still
//! races (another server instance, or a lock evicted mid-flight).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use gallery_core::{ArtworkId, Cart, CartError, UserId};

use crate::db::{ArtworkLookup, CartStore, RepositoryError};

/// How long an unused per-user lock is kept around.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Upper bound on tracked per-user locks.
const MAX_TRACKED_USERS: u64 = 100_000;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("artwork {0} not found")]
    ArtworkNotFound(ArtworkId),

    /// The caller's account no longer exists.
    #[error("user {0} does not exist")]
    UnknownUser(UserId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Per-user async locks guarding cart read-modify-write cycles.
///
/// Cloning shares the same lock table.
#[derive(Clone)]
pub struct CartLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
}

impl Default for CartLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl CartLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(MAX_TRACKED_USERS)
                .time_to_idle(LOCK_IDLE_TIMEOUT)
                .build(),
        }
    }

    /// Wait for exclusive access to a user's cart.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(user_id, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

/// Cart service over a cart store and a catalog.
pub struct CartService<'a, S, A> {
    store: S,
    artworks: A,
    locks: &'a CartLocks,
}

impl<'a, S, A> CartService<'a, S, A>
where
    S: CartStore + Sync,
    A: ArtworkLookup + Sync,
{
    #[must_use]
    pub const fn new(store: S, artworks: A, locks: &'a CartLocks) -> Self {
        Self {
            store,
            artworks,
            locks,
        }
    }

    /// The user's cart, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUser` if the account is gone, or `Repository` on
    /// store failure.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        self.load(user_id).await
    }

    /// Add an artwork to the cart, merging with an existing line.
    ///
    /// `quantity` defaults to 1.
    ///
    /// # Errors
    ///
    /// - `ArtworkNotFound` if the artwork does not exist
    /// - `Cart(InvalidQuantity)` if `quantity < 1`
    /// - `Repository(Conflict)` if a concurrent write won
    pub async fn add(
        &self,
        user_id: UserId,
        artwork_id: ArtworkId,
        quantity: Option<i64>,
    ) -> Result<Cart, CartServiceError> {
        let quantity = quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity).into());
        }

        let snapshot = self
            .artworks
            .snapshot(artwork_id)
            .await?
            .ok_or(CartServiceError::ArtworkNotFound(artwork_id))?;

        self.mutate(user_id, |cart| cart.add(snapshot, quantity))
            .await
    }

    /// Set a line's quantity exactly. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `Cart(LineNotFound)` if the artwork is not in the cart.
    pub async fn update(
        &self,
        user_id: UserId,
        artwork_id: ArtworkId,
        quantity: i64,
    ) -> Result<Cart, CartServiceError> {
        self.mutate(user_id, |cart| cart.set_quantity(artwork_id, quantity))
            .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `Cart(LineNotFound)` if the artwork is not in the cart.
    pub async fn remove(
        &self,
        user_id: UserId,
        artwork_id: ArtworkId,
    ) -> Result<Cart, CartServiceError> {
        self.mutate(user_id, |cart| cart.remove(artwork_id).map(|_| ()))
            .await
    }

    /// Empty the cart. Clearing an empty cart writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` on store failure.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        let _guard = self.locks.acquire(user_id).await;
        let mut cart = self.load(user_id).await?;
        if cart.is_empty() {
            return Ok(cart);
        }

        cart.clear();
        Ok(self.store.save(&cart).await?)
    }

    async fn load(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        self.store.load_or_create(user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => CartServiceError::UnknownUser(user_id),
            other => other.into(),
        })
    }

    async fn mutate<F>(&self, user_id: UserId, change: F) -> Result<Cart, CartServiceError>
    where
        F: FnOnce(&mut Cart) -> Result<(), CartError> + Send,
    {
        let _guard = self.locks.acquire(user_id).await;
        let mut cart = self.load(user_id).await?;
        change(&mut cart)?;
        let saved = self.store.save(&cart).await?;

        tracing::debug!(
            user_id = %user_id,
            lines = saved.lines.len(),
            total = %saved.total,
            "Cart updated"
        );
        Ok(saved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::memory::MemoryStore;

    const USER: UserId = UserId::new(1);

    fn setup() -> (MemoryStore, CartLocks) {
        let store = MemoryStore::new();
        store.put_artwork(1, "Harbour", Decimal::from(100));
        store.put_artwork(2, "Meadow", Decimal::new(2550, 2));
        (store, CartLocks::new())
    }

    #[tokio::test]
    async fn test_get_creates_empty_cart() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);

        let cart = service.get(USER).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
        assert!(store.cart(USER).is_some());
    }

    #[tokio::test]
    async fn test_add_defaults_to_one_and_merges() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);
        let artwork = ArtworkId::new(1);

        service.add(USER, artwork, None).await.unwrap();
        let cart = service.add(USER, artwork, Some(2)).await.unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.total, Decimal::from(300));
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);

        let err = service
            .add(USER, ArtworkId::new(1), Some(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CartServiceError::Cart(CartError::InvalidQuantity(0))
        ));
    }

    #[tokio::test]
    async fn test_add_unknown_artwork() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);

        let err = service
            .add(USER, ArtworkId::new(99), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CartServiceError::ArtworkNotFound(id) if id == ArtworkId::new(99)));
    }

    #[tokio::test]
    async fn test_catalog_price_change_does_not_touch_existing_line() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);
        let artwork = ArtworkId::new(1);

        service.add(USER, artwork, None).await.unwrap();
        store.put_artwork(1, "Harbour", Decimal::from(500));
        let cart = service.add(USER, artwork, None).await.unwrap();

        assert_eq!(cart.lines[0].price, Decimal::from(100));
        assert_eq!(cart.total, Decimal::from(200));
    }

    #[tokio::test]
    async fn test_update_sets_absolute_quantity_and_zero_removes() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);

        service.add(USER, ArtworkId::new(1), Some(5)).await.unwrap();
        service.add(USER, ArtworkId::new(2), Some(2)).await.unwrap();

        let cart = service.update(USER, ArtworkId::new(1), 1).await.unwrap();
        assert_eq!(cart.line(ArtworkId::new(1)).unwrap().quantity, 1);
        assert_eq!(cart.total, Decimal::from(151));

        let cart = service.update(USER, ArtworkId::new(2), -4).await.unwrap();
        assert!(cart.line(ArtworkId::new(2)).is_none());
        assert_eq!(cart.total, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_update_and_remove_missing_line_are_not_found() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);

        let err = service
            .update(USER, ArtworkId::new(1), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CartServiceError::Cart(CartError::LineNotFound(_))
        ));

        let err = service.remove(USER, ArtworkId::new(1)).await.unwrap_err();
        assert!(matches!(
            err,
            CartServiceError::Cart(CartError::LineNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_then_clear() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);

        service.add(USER, ArtworkId::new(1), None).await.unwrap();
        service.add(USER, ArtworkId::new(2), None).await.unwrap();

        let cart = service.remove(USER, ArtworkId::new(1)).await.unwrap();
        assert_eq!(cart.total, Decimal::new(2550, 2));

        let cart = service.clear(USER).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);

        // Idempotent
        let again = service.clear(USER).await.unwrap();
        assert_eq!(again.version, cart.version);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_not_lost() {
        let (store, locks) = setup();
        let locks = Arc::new(locks);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            let locks = Arc::clone(&locks);
            handles.push(tokio::spawn(async move {
                let service = CartService::new(store.clone(), store, &*locks);
                service.add(USER, ArtworkId::new(1), Some(1)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let cart = store.cart(USER).unwrap();
        assert_eq!(cart.lines[0].quantity, 20);
        assert_eq!(cart.total, Decimal::from(2000));
    }

    #[tokio::test]
    async fn test_stale_save_is_a_conflict() {
        let (store, _locks) = setup();
        let first = store.load_or_create(USER).await.unwrap();
        let second = store.load_or_create(USER).await.unwrap();

        store.save(&first).await.unwrap();
        let err = store.save(&second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_deleted_user_gets_unknown_user() {
        let (store, locks) = setup();
        let service = CartService::new(store.clone(), store.clone(), &locks);
        service.add(USER, ArtworkId::new(1), None).await.unwrap();

        store.delete_user(USER);

        assert!(matches!(
            service.get(USER).await,
            Err(CartServiceError::UnknownUser(id)) if id == USER
        ));
        assert!(matches!(
            service.add(USER, ArtworkId::new(1), None).await,
            Err(CartServiceError::UnknownUser(_))
        ));
        assert!(matches!(
            service.clear(USER).await,
            Err(CartServiceError::UnknownUser(_))
        ));
        assert!(store.cart(USER).is_none());
    }
}
