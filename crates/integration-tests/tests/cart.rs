//! Saved cart endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use ecommerce_store_integration_tests::TestApp;

#[tokio::test]
async fn test_save_and_load_cart() {
    let app = TestApp::new();
    let alice = app.shopper("alice").await;
    let bob = app.shopper("bob").await;

    let empty = app.get("/api/users/cart", Some(&alice.token)).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body, json!([]));

    let saved = app
        .post(
            "/api/users/cart",
            Some(&alice.token),
            json!({"items": [
                {"id": 1, "name": "mug", "price": 10.99, "quantity": 2},
                {"productId": 2, "name": "kettle", "price": 20.5, "quantity": 1, "imageUrl": "k.png"}
            ]}),
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.body["message"], "Cart updated successfully");
    assert_eq!(saved.body["items"].as_array().unwrap().len(), 2);

    let loaded = app.get("/api/users/cart", Some(&alice.token)).await;
    let items = loaded.body.as_array().unwrap();
    assert_eq!(items[0]["productId"], 1);
    assert_eq!(items[1]["imageUrl"], "k.png");

    let other = app.get("/api/users/cart", Some(&bob.token)).await;
    assert_eq!(other.body, json!([]));

    let cleared = app
        .post("/api/users/cart", Some(&alice.token), json!({"items": []}))
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(
        app.get("/api/users/cart", Some(&alice.token)).await.body,
        json!([])
    );
}

#[tokio::test]
async fn test_cart_errors() {
    let app = TestApp::new();
    let alice = app.shopper("alice").await;

    assert_eq!(
        app.get("/api/users/cart", None).await.status,
        StatusCode::UNAUTHORIZED
    );

    let missing = app
        .post("/api/users/cart", Some(&alice.token), json!({}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["message"], "Invalid cart data");

    let bad_quantity = app
        .post(
            "/api/users/cart",
            Some(&alice.token),
            json!({"items": [{"id": 1, "name": "mug", "price": 1, "quantity": 0}]}),
        )
        .await;
    assert_eq!(bad_quantity.status, StatusCode::BAD_REQUEST);
}
