//! Order route handlers.
//!
//! Every endpoint requires a bearer token. Shoppers see and cancel their own
//! orders; admins may read any order and drive the status machine.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ecommerce_store_core::{OrderNumber, OrderStatus, OrderStatusError, Price};

use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{CartLine, CurrentUser, Order};
use crate::services::OrderError;
use crate::state::AppState;

/// Body of `POST /api/orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<CartLine>>,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

/// Summary returned after an order is placed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_number: OrderNumber,
    pub order_date: DateTime<Utc>,
    pub total_amount: Price,
    pub status: OrderStatus,
}

/// Body of `POST /api/orders/{orderNumber}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// Result of a status change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub message: &'static str,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
}

/// Place an order from the submitted cart.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    let items = request
        .items
        .ok_or_else(|| AppError::BadRequest("Items are required".to_owned()))?;
    let shipping_address = request.shipping_address.unwrap_or_default();

    let order = state
        .orders()
        .create_order(user.id, &items, &shipping_address)
        .await?;

    add_breadcrumb(
        "order",
        "Order placed",
        &[("order_number", order.order_number.as_str())],
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            order_number: order.order_number,
            order_date: order.order_date,
            total_amount: order.total_amount,
            status: order.status,
        }),
    ))
}

/// The caller's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.orders().get_user_orders(user.id).await?))
}

/// A single order, visible to its owner and to admins.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<Order>> {
    let order = find_order(&state, order_number).await?;

    if !can_view(&user, &order) {
        tracing::warn!(order_number = %order.order_number, "order access denied");
        return Err(AppError::Forbidden(
            "You don't have permission to view this order".to_owned(),
        ));
    }
    Ok(Json(order))
}

/// Cancel one of the caller's own orders.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<StatusChanged>> {
    let order = find_order(&state, order_number).await?;

    if order.user_id != user.id {
        tracing::warn!(order_number = %order.order_number, "cancel denied for non-owner");
        return Err(AppError::Forbidden(
            "You don't have permission to cancel this order".to_owned(),
        ));
    }
    if !order.status.is_cancellable() {
        return Err(AppError::BadRequest(
            "Orders can only be cancelled when in PENDING or PROCESSING status".to_owned(),
        ));
    }

    let order = state.orders().cancel_order(&order.order_number).await?;
    Ok(Json(StatusChanged {
        message: "Order cancelled successfully",
        order_number: order.order_number,
        status: order.status,
    }))
}

/// Move an order to a new status (admin only).
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(order_number): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<StatusChanged>> {
    let raw = request
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Status is required".to_owned()))?;
    let status: OrderStatus = raw
        .parse()
        .map_err(|e: OrderStatusError| AppError::BadRequest(e.to_string()))?;

    let order = state
        .orders()
        .update_order_status(&OrderNumber::new(order_number), status)
        .await?;

    Ok(Json(StatusChanged {
        message: "Order status updated successfully",
        order_number: order.order_number,
        status: order.status,
    }))
}

async fn find_order(state: &AppState, order_number: String) -> Result<Order> {
    let order_number = OrderNumber::new(order_number);
    state
        .orders()
        .get_order_by_number(&order_number)
        .await?
        .ok_or_else(|| OrderError::NotFound(order_number).into())
}

fn can_view(user: &CurrentUser, order: &Order) -> bool {
    order.user_id == user.id || user.is_admin()
}
