//! Product catalog service.
//!
//! Shoppers only ever see active products. Admins see and edit everything.

use thiserror::Error;
use tracing::instrument;

use ecommerce_store_core::ProductId;

use crate::db::{ProductCatalog, RepositoryError};
use crate::models::{Product, ProductInput};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Admin input failed validation.
    #[error("{0}")]
    InvalidProduct(String),

    #[error("Product not found")]
    NotFound(ProductId),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog operations for shoppers and admins.
pub struct CatalogService<'a> {
    catalog: &'a dyn ProductCatalog,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn ProductCatalog) -> Self {
        Self { catalog }
    }

    /// Products visible to shoppers.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the catalog fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.catalog.list_active().await?)
    }

    /// A product visible to shoppers.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product is missing or inactive.
    pub async fn get_active(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.catalog
            .find_by_id(id)
            .await?
            .filter(|p| p.active)
            .ok_or(CatalogError::NotFound(id))
    }

    /// Every product, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the catalog fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.catalog.list_all().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.catalog
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProduct` if the input fails validation.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<Product, CatalogError> {
        let input = validate(input)?;
        let product = self.catalog.create(&input).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProduct` if the input fails validation,
    /// `CatalogError::NotFound` if the product does not exist.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: ProductId, input: ProductInput) -> Result<Product, CatalogError> {
        let input = validate(input)?;
        let product = self
            .catalog
            .update(id, &input)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        tracing::info!("product updated");
        Ok(product)
    }

    /// Show or hide a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: ProductId, active: bool) -> Result<Product, CatalogError> {
        let product = self
            .catalog
            .set_active(id, active)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        tracing::info!("product visibility changed");
        Ok(product)
    }

    /// Delete a product. Orders that contain it keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if self.catalog.delete(id).await? {
            tracing::info!("product deleted");
            Ok(())
        } else {
            Err(CatalogError::NotFound(id))
        }
    }
}

/// Trim text fields and require a name. Price bounds are enforced by `Price` itself.
fn validate(mut input: ProductInput) -> Result<ProductInput, CatalogError> {
    input.name = input.name.trim().to_owned();
    if input.name.is_empty() {
        return Err(CatalogError::InvalidProduct(
            "Product name is required".to_owned(),
        ));
    }
    input.description = input
        .description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty());
    input.image_url = input
        .image_url
        .map(|u| u.trim().to_owned())
        .filter(|u| !u.is_empty());
    Ok(input)
}
