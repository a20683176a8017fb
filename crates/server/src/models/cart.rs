//! Saved shopping cart contents.

use serde::{Deserialize, Serialize};

use ecommerce_store_core::{Price, ProductId, Quantity};

/// One line of a user's saved cart.
///
/// Stored as the client sent it. The name and price are for display only;
/// orders always re-read both from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    pub quantity: Quantity,
}
