//! Product catalog backed by `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use ecommerce_store_core::{Price, ProductId};

use super::{ProductCatalog, RepositoryError};
use crate::models::{Product, ProductInput};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_url, active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    image_url: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// `PostgreSQL` implementation of [`ProductCatalog`].
#[derive(Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn find_products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) AND active"
        ))
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, description, price, image_url, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, image_url = $5, active = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    async fn set_active(
        &self,
        id: ProductId,
        active: bool,
    ) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products SET active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
