//! Core types for the store.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order_number;
pub mod price;
pub mod quantity;
pub mod role;
pub mod status;
pub mod username;

pub use id::*;
pub use order_number::{OrderNumber, OrderNumberGenerator};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use role::{Role, RoleError};
pub use status::{OrderStatus, OrderStatusError};
pub use username::{Username, UsernameError};
