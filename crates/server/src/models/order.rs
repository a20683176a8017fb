//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ecommerce_store_core::{
    OrderId, OrderItemId, OrderNumber, OrderStatus, Price, ProductId, Quantity, UserId,
};

/// A persisted order with its line items.
///
/// `total_amount` is always the sum of the item subtotals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub total_amount: Price,
    /// In the order the customer submitted them.
    pub items: Vec<OrderItem>,
}

/// A persisted order line.
///
/// Name, price and image are copied from the catalog when the order is
/// placed and never follow later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_price: Price,
    pub product_image_url: Option<String>,
    pub quantity: Quantity,
    pub subtotal: Price,
}

/// An order ready to be written, before the store assigns ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub total_amount: Price,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_price: Price,
    pub product_image_url: Option<String>,
    pub quantity: Quantity,
    pub subtotal: Price,
}

/// A cart line submitted for checkout.
///
/// Only the product id and quantity are read. Any client-side price or name
/// is ignored. The quantity stays raw JSON so that `"abc"` is reported as an
/// invalid quantity for that product rather than a malformed request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Value,
}

impl CartLine {
    #[must_use]
    pub fn new(product_id: ProductId, quantity: impl Into<Value>) -> Self {
        Self {
            product_id,
            quantity: quantity.into(),
        }
    }
}
