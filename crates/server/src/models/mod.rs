//! Domain models for the store.
//!
//! These types represent validated domain objects separate from database row
//! types. Row types live next to their queries in `crate::db`.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartItem;
pub use order::{CartLine, NewOrder, NewOrderItem, Order, OrderItem};
pub use product::{Product, ProductInput};
pub use user::{CurrentUser, NewUser, User};
