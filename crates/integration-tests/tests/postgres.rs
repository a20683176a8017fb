//! `PostgreSQL` store tests.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test -p ecommerce-store-integration-tests --test postgres -- --ignored`
//!
//! Migrations are applied on connect. Every test creates its own user with a
//! random name, so runs do not interfere with each other or with old data.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use ecommerce_store_core::{
    OrderNumber, OrderNumberGenerator, OrderStatus, Price, ProductId, Quantity, Role, UserId,
};
use ecommerce_store_integration_tests::TEST_PASSWORD;
use ecommerce_store_server::db::{
    OrderStore, PgOrderStore, PgProductCatalog, PgUserStore, ProductCatalog,
};
use ecommerce_store_server::models::{CartLine, NewOrder, NewOrderItem, ProductInput};
use ecommerce_store_server::services::auth::create_account;
use ecommerce_store_server::services::{InvalidOrderReason, OrderError, OrderService};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("connect to database");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

async fn user(pool: &PgPool) -> UserId {
    let users = PgUserStore::new(pool.clone());
    create_account(&users, &unique("pg"), TEST_PASSWORD, vec![Role::User])
        .await
        .expect("create user")
        .id
}

fn price(cents: i64) -> Price {
    Price::new(Decimal::new(cents, 2)).unwrap()
}

fn item(name: &str) -> NewOrderItem {
    NewOrderItem {
        product_id: ProductId::new(1),
        product_name: name.to_owned(),
        product_price: price(500),
        product_image_url: None,
        quantity: Quantity::new(2).unwrap(),
        subtotal: price(1000),
    }
}

fn new_order(user_id: UserId, order_date: DateTime<Utc>, items: Vec<NewOrderItem>) -> NewOrder {
    NewOrder {
        user_id,
        order_number: OrderNumber::new(unique("ORD")),
        order_date,
        status: OrderStatus::Pending,
        shipping_address: "1 High St".to_owned(),
        total_amount: Price::try_sum(items.iter().map(|i| i.subtotal)).unwrap(),
        items,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_save_writes_order_and_items() {
    let pool = pool().await;
    let orders = PgOrderStore::new(pool.clone());
    let user_id = user(&pool).await;

    let saved = orders
        .save(new_order(user_id, Utc::now(), vec![item("mug"), item("kettle")]))
        .await
        .unwrap();

    let stored = orders
        .find_by_order_number(&saved.order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_amount, price(2000));
    assert_eq!(stored.items.len(), 2);
    assert_eq!(stored.items[0].product_name, "mug");
    assert_eq!(stored.items[1].product_name, "kettle");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_item_insert_rolls_back_order() {
    let pool = pool().await;
    let orders = PgOrderStore::new(pool.clone());
    let user_id = user(&pool).await;

    // PostgreSQL text cannot hold NUL, so the second item insert fails
    // after the order row is already written inside the transaction.
    let order = new_order(user_id, Utc::now(), vec![item("mug"), item("bad\0name")]);
    let number = order.order_number.clone();

    assert!(orders.save(order).await.is_err());
    assert!(orders.find_by_order_number(&number).await.unwrap().is_none());
    assert!(orders.find_by_user_id(user_id).await.unwrap().is_empty());

    let (items,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM order_items i JOIN orders o ON o.id = i.order_id WHERE o.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(items, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_update_status_only_applies_from_expected_status() {
    let pool = pool().await;
    let orders = PgOrderStore::new(pool.clone());
    let user_id = user(&pool).await;
    let saved = orders
        .save(new_order(user_id, Utc::now(), vec![item("mug")]))
        .await
        .unwrap();

    let processing = orders
        .update_status(&saved.order_number, OrderStatus::Pending, OrderStatus::Processing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(processing.status, OrderStatus::Processing);
    assert_eq!(processing.items.len(), 1);

    // A second writer still believes the order is pending.
    let stale = orders
        .update_status(&saved.order_number, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert!(stale.is_none());

    let stored = orders
        .find_by_order_number(&saved.order_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Processing);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_user_orders_newest_first() {
    let pool = pool().await;
    let orders = PgOrderStore::new(pool.clone());
    let user_id = user(&pool).await;
    let now = Utc::now();

    let oldest = orders
        .save(new_order(user_id, now - Duration::minutes(2), vec![item("a")]))
        .await
        .unwrap();
    let tied_first = orders
        .save(new_order(user_id, now - Duration::minutes(1), vec![item("b")]))
        .await
        .unwrap();
    let tied_second = orders
        .save(new_order(user_id, now - Duration::minutes(1), vec![item("c")]))
        .await
        .unwrap();

    let numbers: Vec<OrderNumber> = orders
        .find_by_user_id(user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.order_number)
        .collect();
    assert_eq!(
        numbers,
        vec![
            tied_second.order_number,
            tied_first.order_number,
            oldest.order_number
        ]
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_oversized_order_is_rejected_before_storage() {
    let pool = pool().await;
    let catalog = PgProductCatalog::new(pool.clone());
    let orders = PgOrderStore::new(pool.clone());
    let numbers = OrderNumberGenerator::new();
    let user_id = user(&pool).await;

    let piano = catalog
        .create(&ProductInput {
            name: unique("piano"),
            description: None,
            price: price(100_000_000),
            image_url: None,
            active: true,
        })
        .await
        .unwrap();

    let err = OrderService::new(&catalog, &orders, &numbers)
        .create_order(
            user_id,
            &[CartLine::new(piano.id, json!(2_000_000_000))],
            "",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidOrder(InvalidOrderReason::AmountTooLarge)
    ));
    assert!(orders.find_by_user_id(user_id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_product_prices_are_stored_exactly() {
    let pool = pool().await;
    let catalog = PgProductCatalog::new(pool);

    for sent in [price(1099), price(5), Price::MAX] {
        let product = catalog
            .create(&ProductInput {
                name: unique("exact"),
                description: None,
                price: sent,
                image_url: None,
                active: true,
            })
            .await
            .unwrap();
        let stored = catalog.find_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.price, sent);
        assert_eq!(stored.price.to_string(), sent.to_string());
    }
}
