//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::GalleryConfig;
use crate::services::auth::TokenKeys;
use crate::services::cart::CartLocks;
use crate::services::uploads::ImageStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GalleryConfig,
    pool: PgPool,
    tokens: TokenKeys,
    cart_locks: CartLocks,
    images: ImageStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: GalleryConfig, pool: PgPool) -> Self {
        let tokens = TokenKeys::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        let images = ImageStore::new(config.upload_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                cart_locks: CartLocks::new(),
                images,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &GalleryConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Bearer token signing and verification keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    /// Per-user cart locks, shared by the cart and checkout paths.
    #[must_use]
    pub fn cart_locks(&self) -> &CartLocks {
        &self.inner.cart_locks
    }

    /// Uploaded image storage.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }
}
