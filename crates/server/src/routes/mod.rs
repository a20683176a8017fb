//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (database)
//!
//! # Products (public)
//! GET  /api/products                   - Active products
//! GET  /api/products/{id}              - Active product detail
//!
//! # Auth
//! POST /api/auth/register              - Create account
//! POST /api/auth/login                 - Issue bearer token
//!
//! # Cart (requires auth)
//! GET  /api/users/cart                 - Saved cart
//! POST /api/users/cart                 - Replace saved cart
//!
//! # Orders (requires auth)
//! POST /api/orders                     - Place order
//! GET  /api/orders                     - Own orders, newest first
//! GET  /api/orders/{orderNumber}       - Order detail (owner or admin)
//! POST /api/orders/{orderNumber}/cancel - Cancel own order
//! POST /api/orders/{orderNumber}/status - Change status (admin)
//!
//! # Admin products (requires ROLE_ADMIN)
//! GET    /admin/products               - All products
//! POST   /admin/products               - Create product
//! GET    /admin/products/{id}          - Product detail
//! PUT    /admin/products/{id}          - Replace product
//! PUT    /admin/products/{id}/status   - Show or hide product
//! DELETE /admin/products/{id}          - Delete product
//! ```

pub mod admin_products;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the public product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the saved cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/cart", get(cart::show).post(cart::save))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_mine).post(orders::create))
        .route("/{order_number}", get(orders::show))
        .route("/{order_number}/cancel", post(orders::cancel))
        .route("/{order_number}/status", post(orders::update_status))
}

/// Create the admin product routes router.
pub fn admin_product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(admin_products::index).post(admin_products::create),
        )
        .route(
            "/{id}",
            get(admin_products::show)
                .put(admin_products::update)
                .delete(admin_products::delete),
        )
        .route("/{id}/status", put(admin_products::set_visibility))
}

/// Build the complete routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/products", product_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/users", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/admin/products", admin_product_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
