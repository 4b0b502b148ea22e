//! Application state shared across commands.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::cart::Cart;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::services::{AuthService, CartService, CatalogService};
use crate::session::AuthStore;
use crate::storage::{FileStore, KeyValueStore, keys};

/// Application state shared across the client.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// API client, the auth store and the in-memory cart.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn KeyValueStore>,
    api: ApiClient,
    auth: AuthStore,
    cart: Arc<Mutex<Cart>>,
}

impl AppState {
    /// Create a new application state on top of `storage`.
    ///
    /// Clearing the session (logout, or a rejected token) empties the cart
    /// and drops every cached purchase list.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be read or the HTTP
    /// client cannot be built.
    pub fn new(config: StorefrontConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let auth = AuthStore::load(Arc::clone(&storage))?;
        let api = ApiClient::new(&config, auth.clone())?;
        let cart = Arc::new(Mutex::new(Cart::new()));

        let cache = api.cache().clone();
        let cleared_cart = Arc::clone(&cart);
        let cleared_storage = Arc::clone(&storage);
        auth.on_session_cleared(move || {
            cleared_cart
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            cache.invalidate_purchases_now();
            if let Err(e) = cleared_storage.remove(keys::CART_SELECTION) {
                warn!(error = %e, "Failed to remove stored cart selection");
            }
            debug!("Cart and purchase queries cleared");
        });

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                api,
                auth,
                cart,
            }),
        })
    }

    /// Create a state persisted in the file named by `config.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be read, or as
    /// [`AppState::new`].
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        let storage = FileStore::open(config.storage_path.clone())?;
        Self::new(config, Arc::new(storage))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Where the session is persisted.
    #[must_use]
    pub fn storage_path(&self) -> &Path {
        &self.inner.config.storage_path
    }

    /// Get a reference to the durable store.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.storage
    }

    /// Get a reference to the API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the auth store.
    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    /// Get a reference to the shared cart.
    #[must_use]
    pub fn cart(&self) -> &Mutex<Cart> {
        &self.inner.cart
    }

    /// Authentication operations.
    #[must_use]
    pub fn auth_service(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.api, &self.inner.auth)
    }

    /// Cart operations.
    #[must_use]
    pub fn cart_service(&self) -> CartService<'_> {
        CartService::new(&self.inner.api, &self.inner.cart)
    }

    /// Catalog operations.
    #[must_use]
    pub fn catalog_service(&self) -> CatalogService<'_> {
        CatalogService::new(&self.inner.api)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api", &self.inner.api)
            .field("auth", &self.inner.auth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use shoplet_core::PurchaseStatus;

    use super::*;
    use crate::api::{QueryKey, QueryValue};
    use crate::api::types::fixtures;
    use crate::storage::MemoryStore;

    fn state() -> AppState {
        let config = StorefrontConfig::for_api_url("http://localhost:4000").unwrap();
        AppState::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_clearing_session_empties_cart_and_purchase_cache() {
        let state = state();
        state.storage().set(keys::CART_SELECTION, r#"["a"]"#).unwrap();
        state
            .auth()
            .sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"))
            .unwrap();

        let purchases = vec![fixtures::purchase("a", 1, 10)];
        state.cart().lock().unwrap().reconcile(&purchases, None);
        state
            .api()
            .cache()
            .insert(
                QueryKey::Purchases(PurchaseStatus::InCart),
                QueryValue::Purchases(Arc::new(purchases)),
            )
            .await;

        state.auth().clear().unwrap();

        assert!(state.cart().lock().unwrap().is_empty());
        assert!(
            state
                .api()
                .cache()
                .purchases(PurchaseStatus::InCart)
                .await
                .is_none()
        );
        assert!(!state.auth().is_authenticated());
        assert_eq!(state.storage().get(keys::CART_SELECTION).unwrap(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let state = state();
        let other = state.clone();
        other
            .auth()
            .sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"))
            .unwrap();
        assert!(state.auth().is_authenticated());
    }
}
