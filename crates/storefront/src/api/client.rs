//! HTTP client for the storefront REST backend.
//!
//! Caches catalog reads using `moka`. Purchase lists are always fetched
//! fresh and then written to the cache so other readers can observe them.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use shoplet_core::{ProductId, PurchaseId, PurchaseStatus};

use crate::api::cache::{QueryCache, QueryKey, QueryValue};
use crate::api::types::{
    AuthPayload, Category, Credentials, ErrorResponse, Product, ProductList, ProductListConfig,
    Purchase, PurchaseLine, SuccessResponse,
};
use crate::api::{ApiError, field_errors};
use crate::config::StorefrontConfig;
use crate::session::AuthStore;

/// Placeholder shown for users without an uploaded avatar.
pub const DEFAULT_AVATAR_URL: &str = "https://e7.pngegg.com/pngimages/799/987/png-clipart-computer-icons-avatar-icon-design-avatar-heroes-computer-wallpaper-thumbnail.png";

/// Longest response excerpt written to logs or error messages.
const BODY_EXCERPT_CHARS: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheaply cloneable; clones share the HTTP connection pool, the cache and
/// the auth store the access token is read from.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    auth: AuthStore,
    cache: QueryCache,
}

/// Payload of a batch delete.
#[derive(Debug, Deserialize)]
struct DeletedCount {
    deleted_count: u64,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig, auth: AuthStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                auth,
                cache: QueryCache::new(&config.cache),
            }),
        })
    }

    /// The query cache shared by this client.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Generation of the session requests are currently sent under.
    #[must_use]
    pub fn session_generation(&self) -> u64 {
        self.inner.auth.generation()
    }

    /// Absolute URL of an uploaded image, or the default avatar.
    #[must_use]
    pub fn avatar_url(&self, avatar: Option<&str>) -> String {
        avatar
            .filter(|name| !name.is_empty())
            .and_then(|name| self.inner.base_url.join("images/").ok()?.join(name).ok())
            .map_or_else(|| DEFAULT_AVATAR_URL.to_string(), Into::into)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = self.inner.auth.access_token() {
            builder = builder.header(AUTHORIZATION, token.expose_secret());
        }
        Ok(builder)
    }

    /// Send a request and unwrap the `{ message, data }` envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<SuccessResponse<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(self.reject(status, &response_text));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&response_text),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Map a non-success response, ending the session on a 401.
    ///
    /// A rejected token ends the session the same way a logout does;
    /// session-cleared listeners run before the error is returned.
    fn reject(&self, status: StatusCode, body: &str) -> ApiError {
        let error = error_from_response(status, body);
        if error.is_unauthorized() && self.inner.auth.is_authenticated() {
            warn!("Access token rejected, clearing session");
            if let Err(e) = self.inner.auth.clear() {
                warn!(error = %e, "Failed to remove stored session");
            }
        }
        error
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        config: &ProductListConfig,
    ) -> Result<Arc<ProductList>, ApiError> {
        let key = QueryKey::Products(config.clone());
        if let Some(QueryValue::Products(list)) = self.inner.cache.get(&key).await {
            return Ok(list);
        }

        let builder = self.request(Method::GET, "products")?.query(config);
        let list = Arc::new(self.execute::<ProductList>(builder).await?.data);
        debug!(count = list.products.len(), "Fetched products");

        self.inner
            .cache
            .insert(key, QueryValue::Products(Arc::clone(&list)))
            .await;
        Ok(list)
    }

    /// Get one product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Arc<Product>, ApiError> {
        let key = QueryKey::Product(id.clone());
        if let Some(QueryValue::Product(product)) = self.inner.cache.get(&key).await {
            return Ok(product);
        }

        let builder = self.request(Method::GET, &format!("products/{id}"))?;
        let product = Arc::new(self.execute::<Product>(builder).await?.data);

        self.inner
            .cache
            .insert(key, QueryValue::Product(Arc::clone(&product)))
            .await;
        Ok(product)
    }

    /// List every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        let key = QueryKey::Categories;
        if let Some(QueryValue::Categories(categories)) = self.inner.cache.get(&key).await {
            return Ok(categories);
        }

        let builder = self.request(Method::GET, "categories")?;
        let categories = Arc::new(self.execute::<Vec<Category>>(builder).await?.data);

        self.inner
            .cache
            .insert(key, QueryValue::Categories(Arc::clone(&categories)))
            .await;
        Ok(categories)
    }

    // =========================================================================
    // Purchase Methods
    // =========================================================================

    /// Fetch the purchases with a given status, bypassing and then refreshing the cache.
    ///
    /// A response that arrives after the session changed is returned to the
    /// caller but never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_purchases(
        &self,
        status: PurchaseStatus,
    ) -> Result<Arc<Vec<Purchase>>, ApiError> {
        let generation = self.session_generation();
        let builder = self
            .request(Method::GET, "purchases")?
            .query(&[("status", status.code())]);
        let purchases = Arc::new(self.execute::<Vec<Purchase>>(builder).await?.data);
        debug!(count = purchases.len(), "Fetched purchases");

        if self.session_generation() != generation {
            debug!("Session changed during fetch, not caching purchases");
            return Ok(purchases);
        }

        let key = QueryKey::Purchases(status);
        self.inner
            .cache
            .insert(key.clone(), QueryValue::Purchases(Arc::clone(&purchases)))
            .await;
        // A clear that landed during the insert may have run its
        // invalidation before the entry existed.
        if self.session_generation() != generation {
            self.inner.cache.invalidate(&key).await;
        }
        Ok(purchases)
    }

    /// Put a product into the cart (or raise its quantity).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %line.product_id, buy_count = line.buy_count))]
    pub async fn add_to_cart(&self, line: &PurchaseLine) -> Result<Purchase, ApiError> {
        let builder = self.request(Method::POST, "purchases/add-to-cart")?.json(line);
        Ok(self.execute::<Purchase>(builder).await?.data)
    }

    /// Set the quantity of an in-cart product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %line.product_id, buy_count = line.buy_count))]
    pub async fn update_purchase(&self, line: &PurchaseLine) -> Result<Purchase, ApiError> {
        let builder = self.request(Method::PUT, "purchases")?.json(line);
        Ok(self.execute::<Purchase>(builder).await?.data)
    }

    /// Check out the given lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn buy_products(
        &self,
        lines: &[PurchaseLine],
    ) -> Result<SuccessResponse<Vec<Purchase>>, ApiError> {
        let builder = self.request(Method::POST, "purchases/buy")?.json(lines);
        self.execute::<Vec<Purchase>>(builder).await
    }

    /// Delete purchases by id. Returns how many the backend removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    pub async fn delete_purchases(&self, ids: &[PurchaseId]) -> Result<u64, ApiError> {
        let builder = self.request(Method::DELETE, "purchases")?.json(ids);
        Ok(self.execute::<DeletedCount>(builder).await?.data.deleted_count)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::UnprocessableEntity` for rejected fields, or another
    /// error if the API request fails.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn register(
        &self,
        credentials: &Credentials,
    ) -> Result<SuccessResponse<AuthPayload>, ApiError> {
        let builder = self.request(Method::POST, "auth/register")?.json(credentials);
        self.execute::<AuthPayload>(builder).await
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::UnprocessableEntity` for rejected fields, or another
    /// error if the API request fails.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<SuccessResponse<AuthPayload>, ApiError> {
        let builder = self.request(Method::POST, "auth/login")?.json(credentials);
        self.execute::<AuthPayload>(builder).await
    }

    /// Revoke the current access token. Returns the backend message.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<String, ApiError> {
        let builder = self.request(Method::POST, "auth/logout")?;
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(self.reject(status, &text));
        }
        // Logout responses carry no `data`.
        Ok(serde_json::from_str::<ErrorResponse>(&text)
            .map(|body| body.message)
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

/// Map a non-success response onto an `ApiError`.
fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let parsed: Option<ErrorResponse> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| excerpt(body));

    match status {
        StatusCode::UNPROCESSABLE_ENTITY => ApiError::UnprocessableEntity {
            fields: field_errors(parsed.as_ref().and_then(|e| e.data.as_ref())),
            message,
        },
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => {
            tracing::error!(
                status = %status,
                body = %excerpt(body),
                "Storefront API returned non-success status"
            );
            ApiError::Status { status, message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_avatar_url() {
        use crate::storage::MemoryStore;

        let config = StorefrontConfig::for_api_url("http://localhost:4000/api").unwrap();
        let auth = AuthStore::load(Arc::new(MemoryStore::new())).unwrap();
        let client = ApiClient::new(&config, auth).unwrap();

        assert_eq!(
            client.avatar_url(Some("u-1.png")),
            "http://localhost:4000/api/images/u-1.png"
        );
        assert_eq!(client.avatar_url(None), DEFAULT_AVATAR_URL);
        assert_eq!(client.avatar_url(Some("")), DEFAULT_AVATAR_URL);
        assert!(DEFAULT_AVATAR_URL.starts_with("https://e7.pngegg.com/"));
    }

    #[test]
    fn test_error_from_response_unprocessable() {
        let body = r#"{"message":"Lỗi","data":{"email":"Email không hợp lệ"}}"#;
        let err = error_from_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        match err {
            ApiError::UnprocessableEntity { message, fields } => {
                assert_eq!(message, "Lỗi");
                assert_eq!(fields["email"], "Email không hợp lệ");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_response_unauthorized() {
        let body = r#"{"message":"Token hết hạn","data":{"name":"EXPIRED_TOKEN"}}"#;
        let err = error_from_response(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Token hết hạn"));
    }

    #[test]
    fn test_error_from_response_plain_text_body() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, "upstream exploded");
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(2 * BODY_EXCERPT_CHARS);
        assert_eq!(excerpt(&long).len(), BODY_EXCERPT_CHARS);
    }
}
