//! Query cache for API responses.

use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use shoplet_core::{ProductId, PurchaseStatus};

use crate::api::types::{Category, Product, ProductList, ProductListConfig, Purchase};
use crate::config::CacheConfig;

/// Cache key for catalog and purchase queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum QueryKey {
    Products(ProductListConfig),
    Product(ProductId),
    Categories,
    Purchases(PurchaseStatus),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum QueryValue {
    Products(Arc<ProductList>),
    Product(Arc<Product>),
    Categories(Arc<Vec<Category>>),
    Purchases(Arc<Vec<Purchase>>),
}

/// Shared query cache.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, QueryValue>,
}

impl QueryCache {
    /// Create a cache with the configured capacity and TTL.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.time_to_live)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Look up a cached value.
    pub async fn get(&self, key: &QueryKey) -> Option<QueryValue> {
        let hit = self.inner.get(key).await;
        if hit.is_some() {
            debug!(?key, "Cache hit");
        }
        hit
    }

    /// Store a value.
    pub async fn insert(&self, key: QueryKey, value: QueryValue) {
        self.inner.insert(key, value).await;
    }

    /// Drop one entry.
    pub async fn invalidate(&self, key: &QueryKey) {
        self.inner.invalidate(key).await;
    }

    /// Cached purchase list for a status, if any.
    pub async fn purchases(&self, status: PurchaseStatus) -> Option<Arc<Vec<Purchase>>> {
        match self.get(&QueryKey::Purchases(status)).await {
            Some(QueryValue::Purchases(purchases)) => Some(purchases),
            _ => None,
        }
    }

    /// Drop every cached purchase list.
    pub async fn invalidate_purchases(&self) {
        for status in PurchaseStatus::ALL {
            self.inner.invalidate(&QueryKey::Purchases(status)).await;
        }
        debug!("Purchase queries invalidated");
    }

    /// Drop every cached purchase list without awaiting.
    ///
    /// Used from synchronous session-cleared listeners. Reads issued after
    /// this call no longer see the dropped entries.
    pub fn invalidate_purchases_now(&self) {
        if let Err(e) = self
            .inner
            .invalidate_entries_if(|key, _| matches!(key, QueryKey::Purchases(_)))
        {
            tracing::warn!(error = %e, "Falling back to full cache invalidation");
            self.inner.invalidate_all();
        }
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::fixtures;

    fn cache() -> QueryCache {
        QueryCache::new(&CacheConfig::default())
    }

    async fn seed(cache: &QueryCache) {
        let purchases = Arc::new(vec![fixtures::purchase("a", 1, 10)]);
        for status in [PurchaseStatus::InCart, PurchaseStatus::Delivered] {
            cache
                .insert(
                    QueryKey::Purchases(status),
                    QueryValue::Purchases(Arc::clone(&purchases)),
                )
                .await;
        }
        cache.insert(QueryKey::Categories, QueryValue::Categories(Arc::new(Vec::new()))).await;
    }

    #[tokio::test]
    async fn test_invalidate_purchases_keeps_catalog() {
        let cache = cache();
        seed(&cache).await;

        cache.invalidate_purchases().await;

        assert!(cache.purchases(PurchaseStatus::InCart).await.is_none());
        assert!(cache.purchases(PurchaseStatus::Delivered).await.is_none());
        assert!(cache.get(&QueryKey::Categories).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_purchases_now() {
        let cache = cache();
        seed(&cache).await;

        cache.invalidate_purchases_now();

        assert!(cache.purchases(PurchaseStatus::InCart).await.is_none());
        assert!(cache.get(&QueryKey::Categories).await.is_some());
    }
}
