//! Public product route handlers.
//!
//! Shoppers only ever see active products.

use axum::{
    Json,
    extract::{Path, State},
};

use ecommerce_store_core::ProductId;

use crate::error::Result;
use crate::models::Product;
use crate::state::AppState;

/// List the active catalog.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list_active().await?))
}

/// Product detail. Hidden products are reported as missing.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get_active(id).await?))
}
