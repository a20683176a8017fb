//! Order storage backed by `PostgreSQL`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use ecommerce_store_core::{
    OrderId, OrderItemId, OrderNumber, OrderStatus, Price, ProductId, Quantity, UserId,
};

use super::{OrderStore, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem};

const ORDER_COLUMNS: &str =
    "id, user_id, order_number, order_date, status, shipping_address, total_amount";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    order_number: String,
    order_date: DateTime<Utc>,
    status: String,
    shipping_address: String,
    total_amount: Decimal,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    product_price: Decimal,
    product_image_url: Option<String>,
    quantity: i32,
    subtotal: Decimal,
}

fn corrupt(what: &str, id: i32, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {what} in row {id}: {e}"))
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            product_price: Price::new(row.product_price)
                .map_err(|e| corrupt("product_price", row.id, e))?,
            product_image_url: row.product_image_url,
            quantity: Quantity::try_from(row.quantity)
                .map_err(|e| corrupt("quantity", row.id, e))?,
            subtotal: Price::new(row.subtotal).map_err(|e| corrupt("subtotal", row.id, e))?,
        })
    }
}

fn into_order(row: OrderRow, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
    Ok(Order {
        id: OrderId::new(row.id),
        user_id: UserId::new(row.user_id),
        order_number: OrderNumber::new(row.order_number),
        order_date: row.order_date,
        status: row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| corrupt("status", row.id, e))?,
        shipping_address: row.shipping_address,
        total_amount: Price::new(row.total_amount)
            .map_err(|e| corrupt("total_amount", row.id, e))?,
        items,
    })
}

/// `PostgreSQL` implementation of [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the items for `rows` with one query and assemble the orders,
    /// keeping the row order.
    async fn with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, product_price,
                   product_image_url, quantity, subtotal
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            ",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for item_row in item_rows {
            let order_id = item_row.order_id;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(item_row.try_into()?);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                into_order(row, items)
            })
            .collect()
    }

    async fn with_items_one(&self, row: OrderRow) -> Result<Order, RepositoryError> {
        self.with_items(vec![row])
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn save(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (user_id, order_number, order_date, status, shipping_address, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(&order.order_number)
        .bind(order.order_date)
        .bind(order.status)
        .bind(&order.shipping_address)
        .bind(order.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "order number"))?;

        let mut items = Vec::with_capacity(order.items.len());
        for (position, item) in (0_i32..).zip(order.items) {
            let item_row = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO order_items
                    (order_id, position, product_id, product_name, product_price,
                     product_image_url, quantity, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id, order_id, product_id, product_name, product_price,
                          product_image_url, quantity, subtotal
                ",
            )
            .bind(order_row.id)
            .bind(position)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.product_price)
            .bind(&item.product_image_url)
            .bind(item.quantity)
            .bind(item.subtotal)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem::try_from(item_row)?);
        }

        tx.commit().await?;

        into_order(order_row, items)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY order_date DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(rows).await
    }

    async fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.with_items_one(row).await.map(Some),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(order_number = %order_number))]
    async fn update_status(
        &self,
        order_number: &OrderNumber,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders SET status = $3
            WHERE order_number = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order_number)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.with_items_one(row).await.map(Some),
            None => Ok(None),
        }
    }
}
