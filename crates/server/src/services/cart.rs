//! Saved cart service.

use tracing::instrument;

use ecommerce_store_core::UserId;

use crate::db::{CartStore, RepositoryError};
use crate::models::CartItem;

/// Reads and replaces a user's saved cart.
pub struct CartService<'a> {
    carts: &'a dyn CartStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(carts: &'a dyn CartStore) -> Self {
        Self { carts }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        self.carts.get_items(user_id).await
    }

    /// Replace the saved cart with `items`. An empty list clears it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails; the old cart is kept.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn save_cart(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let saved = self.carts.replace_items(user_id, items).await?;
        tracing::debug!("cart saved");
        Ok(saved)
    }
}
