//! Order workflow error types.

use thiserror::Error;

use ecommerce_store_core::{OrderNumber, OrderStatus};

use crate::db::RepositoryError;

/// Why a cart could not be turned into an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOrderReason {
    #[error("Cannot create order with empty cart")]
    EmptyCart,

    /// A product is unknown or no longer sold.
    #[error("One or more products in your cart are no longer available")]
    ProductUnavailable,

    /// The quantity is not a whole number.
    #[error("Invalid quantity for product: {product_name}")]
    InvalidQuantity { product_name: String },

    #[error("Quantity must be greater than zero for product: {product_name}")]
    NonPositiveQuantity { product_name: String },

    #[error("Order total is too large")]
    AmountTooLarge,
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The submitted cart was rejected. Nothing was written.
    #[error("{0}")]
    InvalidOrder(#[from] InvalidOrderReason),

    #[error("Order not found")]
    NotFound(OrderNumber),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A concurrent write got there first.
    #[error("{0}")]
    Conflict(String),

    /// The catalog or order store failed.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}
