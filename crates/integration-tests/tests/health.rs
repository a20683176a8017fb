//! Health checks and cross-cutting layers.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use ecommerce_store_integration_tests::TestApp;

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::new();
    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::new();
    let response = app.get("/health/ready", None).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    assert_eq!(app.get("/api/nope", None).await.status, StatusCode::NOT_FOUND);
}
