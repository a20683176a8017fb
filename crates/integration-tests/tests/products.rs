//! Public catalog and admin product management.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use ecommerce_store_integration_tests::{TestApp, decimal};

#[tokio::test]
async fn test_public_catalog_hides_inactive() {
    let app = TestApp::new();
    let mug = app.product("mug", 1099, true).await;
    let hidden = app.product("retired", 500, false).await;

    let listed = app.get("/api/products", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let listed = listed.body.as_array().unwrap().clone();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "mug");
    assert_eq!(decimal(&listed[0]["price"]), Decimal::new(1099, 2));
    assert_eq!(listed[0]["imageUrl"], "https://img.test/mug.png");

    let shown = app.get(&format!("/api/products/{}", mug.id), None).await;
    assert_eq!(shown.status, StatusCode::OK);

    let missing = app.get(&format!("/api/products/{}", hidden.id), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Product not found");
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = TestApp::new();
    let alice = app.shopper("alice").await;

    assert_eq!(
        app.get("/admin/products", None).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/admin/products", Some(&alice.token)).await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_admin_product_lifecycle() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let token = Some(admin.token.as_str());

    let created = app
        .post(
            "/admin/products",
            token,
            json!({"name": " Teapot ", "price": "24.00", "description": "Cast iron"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["name"], "Teapot");
    assert_eq!(created.body["active"], true);
    let id = created.body["id"].as_i64().unwrap();
    let uri = format!("/admin/products/{id}");

    let updated = app
        .request(
            Method::PUT,
            &uri,
            token,
            Some(json!({"name": "Teapot", "price": 26.5})),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(decimal(&updated.body["price"]), Decimal::new(265, 1));

    let hidden = app
        .request(
            Method::PUT,
            &format!("{uri}/status"),
            token,
            Some(json!({"active": false})),
        )
        .await;
    assert_eq!(hidden.body["active"], false);
    assert_eq!(app.get("/api/products", None).await.body, json!([]));
    assert_eq!(app.get(&uri, token).await.status, StatusCode::OK);

    let no_flag = app
        .request(Method::PUT, &format!("{uri}/status"), token, Some(json!({})))
        .await;
    assert_eq!(no_flag.status, StatusCode::BAD_REQUEST);

    let deleted = app.request(Method::DELETE, &uri, token, None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let again = app.request(Method::DELETE, &uri, token, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_product_validation() {
    let app = TestApp::new();
    let admin = app.admin("root").await;

    let blank = app
        .post(
            "/admin/products",
            Some(&admin.token),
            json!({"name": "  ", "price": 1}),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.body["message"], "Product name is required");

    let negative = app
        .post(
            "/admin/products",
            Some(&admin.token),
            json!({"name": "Mug", "price": -1}),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    // Storage keeps cents; a third decimal place would be rounded away.
    let fractional = app
        .post(
            "/admin/products",
            Some(&admin.token),
            json!({"name": "Mug", "price": 10.999}),
        )
        .await;
    assert_eq!(fractional.status, StatusCode::BAD_REQUEST);

    let huge = app
        .post(
            "/admin/products",
            Some(&admin.token),
            json!({"name": "Mug", "price": "10000000000000"}),
        )
        .await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST);

    let listed = app.get("/admin/products", Some(&admin.token)).await;
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn test_order_snapshot_survives_catalog_edits() {
    let app = TestApp::new();
    let admin = app.admin("root").await;
    let alice = app.shopper("alice").await;
    let mug = app.product("mug", 1000, true).await;

    let created = app
        .post(
            "/api/orders",
            Some(&alice.token),
            json!({"items": [{"id": mug.id, "quantity": 1}]}),
        )
        .await;
    let number = created.body["orderNumber"].as_str().unwrap().to_owned();

    app.request(
        Method::PUT,
        &format!("/admin/products/{}", mug.id),
        Some(&admin.token),
        Some(json!({"name": "Big mug", "price": 99})),
    )
    .await;
    app.request(
        Method::DELETE,
        &format!("/admin/products/{}", mug.id),
        Some(&admin.token),
        None,
    )
    .await;

    let detail = app
        .get(&format!("/api/orders/{number}"), Some(&alice.token))
        .await;
    assert_eq!(detail.body["items"][0]["productName"], "mug");
    assert_eq!(decimal(&detail.body["totalAmount"]), Decimal::new(1000, 2));
}
