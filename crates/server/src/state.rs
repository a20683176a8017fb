//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use ecommerce_store_core::OrderNumberGenerator;

use crate::db::{
    CartStore, OrderStore, PgCartStore, PgOrderStore, PgProductCatalog, PgUserStore,
    ProductCatalog, UserStore,
};
use crate::services::{AuthService, CartService, CatalogService, OrderService, TokenKeys};

/// The storage backends the handlers work against.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn ProductCatalog>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserStore>,
    pub carts: Arc<dyn CartStore>,
}

impl Stores {
    /// `PostgreSQL` stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            catalog: Arc::new(PgProductCatalog::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            carts: Arc::new(PgCartStore::new(pool.clone())),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like stores and signing keys.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    stores: Stores,
    token_keys: TokenKeys,
    order_numbers: OrderNumberGenerator,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(pool: PgPool, token_keys: TokenKeys) -> Self {
        let stores = Stores::postgres(&pool);
        Self::with_stores(pool, stores, token_keys)
    }

    /// Create application state over explicit stores.
    ///
    /// `pool` is only used by the readiness check.
    #[must_use]
    pub fn with_stores(pool: PgPool, stores: Stores, token_keys: TokenKeys) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                stores,
                token_keys,
                order_numbers: OrderNumberGenerator::new(),
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn token_keys(&self) -> &TokenKeys {
        &self.inner.token_keys
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        let stores = &self.inner.stores;
        OrderService::new(
            stores.catalog.as_ref(),
            stores.orders.as_ref(),
            &self.inner.order_numbers,
        )
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.inner.stores.catalog.as_ref())
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.inner.stores.users.as_ref(), &self.inner.token_keys)
    }

    #[must_use]
    pub fn carts(&self) -> CartService<'_> {
        CartService::new(self.inner.stores.carts.as_ref())
    }
}
