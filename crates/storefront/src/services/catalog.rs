//! Catalog browsing.

use std::sync::Arc;

use tracing::instrument;

use shoplet_core::ProductId;

use crate::api::ApiClient;
use crate::api::types::{Category, Product, ProductList, ProductListConfig};
use crate::error::{AppError, Result};
use crate::slug::get_id_from_name_id;

/// Read-only access to products and categories.
pub struct CatalogService<'a> {
    api: &'a ApiClient,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// One page of products matching `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn list(&self, config: &ProductListConfig) -> Result<Arc<ProductList>> {
        Ok(self.api.get_products(config).await?)
    }

    /// Look a product up by its slug (`name-i,id`) or bare id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist, or another
    /// error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn product(&self, slug_or_id: &str) -> Result<Arc<Product>> {
        let id = get_id_from_name_id(slug_or_id.trim());
        if id.is_empty() {
            return Err(AppError::NotFound(slug_or_id.to_string()));
        }
        Ok(self.api.get_product(&ProductId::new(id)).await?)
    }

    /// Every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>> {
        Ok(self.api.get_categories().await?)
    }
}
