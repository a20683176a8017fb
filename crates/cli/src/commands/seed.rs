//! Seed the product catalog from a JSON file.
//!
//! The file holds an array of products in the same shape the admin API
//! accepts:
//!
//! ```json
//! [
//!   {"name": "Espresso Cup", "description": "90ml", "price": 8.50, "imageUrl": null},
//!   {"name": "Gooseneck Kettle", "price": 64.00, "active": false}
//! ]
//! ```

use std::path::Path;

use thiserror::Error;
use tracing::info;

use ecommerce_store_server::db::PgProductCatalog;
use ecommerce_store_server::models::ProductInput;
use ecommerce_store_server::services::{CatalogError, CatalogService};

use super::{CommandError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid product file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Product {index} rejected: {source}")]
    Product {
        index: usize,
        #[source]
        source: CatalogError,
    },
}

/// Parse a product seed file's contents.
///
/// # Errors
///
/// Returns `SeedError::Parse` if the JSON is not an array of products.
pub fn parse_products(content: &str) -> Result<Vec<ProductInput>, SeedError> {
    Ok(serde_json::from_str(content)?)
}

/// Insert every product in `file_path` into the catalog.
///
/// The file is parsed in full before connecting, so a malformed file
/// writes nothing. Returns the number of products created.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or a product fails validation.
pub async fn products(file_path: &str) -> Result<usize, SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let inputs = parse_products(&content)?;
    info!(products = inputs.len(), "Parsed product file");

    let pool = connect().await?;
    let catalog = PgProductCatalog::new(pool);
    let service = CatalogService::new(&catalog);

    let count = inputs.len();
    for (index, input) in inputs.into_iter().enumerate() {
        let product = service
            .create(input)
            .await
            .map_err(|source| SeedError::Product { index, source })?;
        info!(product_id = %product.id, name = %product.name, "Seeded product");
    }

    info!(created = count, "Seeding complete");
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_products() {
        let products = parse_products(
            r#"[
                {"name": "Espresso Cup", "description": "90ml", "price": 8.50},
                {"name": "Gooseneck Kettle", "price": "64.00", "active": false}
            ]"#,
        )
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Espresso Cup");
        assert!(products[0].active);
        assert!(!products[1].active);
    }

    #[test]
    fn test_parse_rejects_negative_price() {
        assert!(matches!(
            parse_products(r#"[{"name": "Mug", "price": -3}]"#),
            Err(SeedError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_products(r#"{"name": "Mug", "price": 3}"#).is_err());
    }
}
