//! Admin product management.
//!
//! All handlers require `ROLE_ADMIN`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use ecommerce_store_core::ProductId;

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput};
use crate::state::AppState;

/// Body of `PUT /admin/products/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    #[serde(default)]
    pub active: Option<bool>,
}

/// Every product, including hidden ones.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list_all().await?))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get(id).await?))
}

#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().update(id, input).await?))
}

/// Show or hide a product.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn set_visibility(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    ApiJson(request): ApiJson<VisibilityRequest>,
) -> Result<Json<Product>> {
    let active = request
        .active
        .ok_or_else(|| AppError::BadRequest("Active status is required".to_owned()))?;
    Ok(Json(state.catalog().set_active(id, active).await?))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.catalog().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
