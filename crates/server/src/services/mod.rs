//! Business logic services.
//!
//! # Services
//!
//! - `orders` - Order creation, queries and status lifecycle
//! - `catalog` - Product listing and admin product management
//! - `auth` - Registration, login and bearer tokens
//! - `cart` - Saved carts
//!
//! Services borrow their stores from `AppState` for the duration of a
//! request and hold no state of their own.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

pub use auth::{AuthError, AuthService, TokenKeys};
pub use cart::CartService;
pub use catalog::{CatalogError, CatalogService};
pub use orders::{InvalidOrderReason, OrderError, OrderService};
