//! Saved cart route handlers.
//!
//! The cart lives server-side per user so it follows them across devices.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CartItem;
use crate::state::AppState;

/// Body of `POST /api/users/cart`.
#[derive(Debug, Deserialize)]
pub struct SaveCartRequest {
    #[serde(default)]
    pub items: Option<Vec<CartItem>>,
}

#[derive(Debug, Serialize)]
pub struct CartSaved {
    pub message: &'static str,
    pub items: Vec<CartItem>,
}

/// The caller's saved cart.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartItem>>> {
    Ok(Json(state.carts().get_cart(user.id).await?))
}

/// Replace the caller's saved cart.
pub async fn save(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<SaveCartRequest>,
) -> Result<Json<CartSaved>> {
    let items = request
        .items
        .ok_or_else(|| AppError::BadRequest("Invalid cart data".to_owned()))?;
    let items = state.carts().save_cart(user.id, &items).await?;

    Ok(Json(CartSaved {
        message: "Cart updated successfully",
        items,
    }))
}
