//! Saved carts backed by `PostgreSQL`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use ecommerce_store_core::{Price, ProductId, Quantity, UserId};

use super::{CartStore, RepositoryError};
use crate::models::CartItem;

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    product_id: i32,
    name: String,
    price: Decimal,
    image_url: Option<String>,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price: Price::new(row.price).map_err(|e| {
                RepositoryError::DataCorruption(format!("cart item {}: {e}", row.id))
            })?,
            image_url: row.image_url,
            quantity: Quantity::try_from(row.quantity).map_err(|e| {
                RepositoryError::DataCorruption(format!("cart item {}: {e}", row.id))
            })?,
        })
    }
}

/// `PostgreSQL` implementation of [`CartStore`].
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn get_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, product_id, name, price, image_url, quantity
            FROM cart_items
            WHERE user_id = $1
            ORDER BY position
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CartItem::try_from)
        .collect()
    }

    async fn replace_items(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (position, item) in (0_i32..).zip(items) {
            sqlx::query(
                r"
                INSERT INTO cart_items (user_id, product_id, name, price, image_url, quantity, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(user_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(&item.image_url)
            .bind(item.quantity)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(items.to_vec())
    }
}
