//! Database operations for the store `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `products` - Catalog, including hidden (inactive) products
//! - `users` - Accounts with argon2 password hashes and roles
//! - `cart_items` - Saved carts, one row per line
//! - `orders` / `order_items` - Placed orders and their line snapshots
//!
//! Services talk to storage through the traits below so that the same
//! workflow runs against `PostgreSQL` in production and the in-memory
//! stores in [`memory`] under test.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p ecommerce-store-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use ecommerce_store_core::{OrderNumber, OrderStatus, ProductId, UserId, Username};

use crate::models::{CartItem, NewOrder, NewUser, Order, Product, ProductInput, User};

pub use carts::PgCartStore;
pub use orders::PgOrderStore;
pub use products::PgProductCatalog;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username or order number).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_insert(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Read and write access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync + 'static {
    /// Active products among `ids`, in no particular order. Unknown and
    /// inactive ids are simply absent from the result.
    async fn find_products_by_ids(&self, ids: &[ProductId])
    -> Result<Vec<Product>, RepositoryError>;

    /// All active products, by id.
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Every product including inactive ones, by id.
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;

    /// A product regardless of its active flag.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError>;

    /// Replace every editable field. `None` when the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, RepositoryError>;

    async fn set_active(
        &self,
        id: ProductId,
        active: bool,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Persistence for orders and their line items.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Insert the order and all of its items atomically.
    ///
    /// Returns `RepositoryError::Conflict` if the order number is taken.
    async fn save(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// A user's orders, newest first. Orders placed at the same instant come
    /// back most recently inserted first.
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    async fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Set the status to `next` only if it is still `expected`.
    ///
    /// Returns `None` if no order with that number currently has status
    /// `expected`.
    async fn update_status(
        &self,
        order_number: &OrderNumber,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// The user and their password hash, for login.
    async fn find_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Saved carts.
#[async_trait]
pub trait CartStore: Send + Sync + 'static {
    async fn get_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Replace the whole cart in one transaction.
    async fn replace_items(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<Vec<CartItem>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
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
