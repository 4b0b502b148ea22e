//! Wire types for the storefront REST API.
//!
//! Field names follow the backend's JSON (`_id`, `createdAt`, snake_case
//! money fields). These types are also the domain types the rest of the crate
//! works with; the backend is the source of truth and nothing is re-modelled.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use shoplet_core::{CategoryId, Price, ProductId, PurchaseId, PurchaseStatus, UserId};

// =============================================================================
// Response Envelopes
// =============================================================================

/// Successful response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SuccessResponse<T> {
    /// Human-readable message from the backend.
    pub message: String,
    /// Response payload.
    pub data: T,
}

/// Error response envelope.
///
/// For 422 responses `data` carries a field-name to message map.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message from the backend.
    #[serde(default)]
    pub message: String,
    /// Optional structured details.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
}

/// A product as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    /// Main image URL.
    pub image: String,
    /// Gallery image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Current selling price.
    pub price: Price,
    /// List price before discount.
    pub price_before_discount: Price,
    /// Units in stock.
    pub quantity: u32,
    /// Average rating (0-5).
    #[serde(default)]
    pub rating: f64,
    /// Units sold.
    #[serde(default)]
    pub sold: u64,
    /// Detail page views.
    #[serde(default)]
    pub view: u64,
    /// HTML description.
    #[serde(default)]
    pub description: Option<String>,
    /// Owning category.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Pagination block of a product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Total number of pages.
    pub page_size: u32,
}

/// One page of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Sort direction for product queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

/// Sort key for product queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortBy {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "view")]
    View,
    #[serde(rename = "sold")]
    Sold,
    #[serde(rename = "price")]
    Price,
}

/// Query parameters for `GET products`.
///
/// Unset fields are omitted from the query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductListConfig {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    /// Product to leave out (used for "related products").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<ProductId>,
    /// Minimum rating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_filter: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<Decimal>,
    /// Case-insensitive name search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for ProductListConfig {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            order: None,
            sort_by: None,
            category: None,
            exclude: None,
            rating_filter: None,
            price_max: None,
            price_min: None,
            name: None,
        }
    }
}

// =============================================================================
// Purchase Types
// =============================================================================

/// A server-tracked purchase (cart line or placed order line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(rename = "_id")]
    pub id: PurchaseId,
    /// Snapshot of the product at fetch time.
    pub product: Product,
    /// Ordered quantity.
    pub buy_count: u32,
    /// Unit price when the line was created.
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub price_before_discount: Price,
    pub status: PurchaseStatus,
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for add-to-cart, update-quantity and each checkout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub buy_count: u32,
}

// =============================================================================
// Auth Types
// =============================================================================

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

/// Authenticated user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Login/registration request body.
///
/// `Debug` output redacts the password.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from raw form input.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Login/registration response payload.
#[derive(Deserialize)]
pub struct AuthPayload {
    /// Opaque token, sent back verbatim in the `Authorization` header.
    #[serde(deserialize_with = "deserialize_secret")]
    pub access_token: SecretString,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires: Option<u64>,
    pub user: User,
}

impl std::fmt::Debug for AuthPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPayload")
            .field("access_token", &"[REDACTED]")
            .field("expires", &self.expires)
            .field("user", &self.user)
            .finish()
    }
}

fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_purchase_deserializes_backend_shape() {
        let body = json!({
            "_id": "pur-1",
            "buy_count": 2,
            "price": 100,
            "price_before_discount": 120,
            "status": -1,
            "user": "u-1",
            "product": {
                "_id": "prod-1",
                "name": "Áo Thun",
                "image": "https://cdn.example.com/a.jpg",
                "images": [],
                "price": 100,
                "price_before_discount": 120,
                "quantity": 5,
                "rating": 4.2,
                "sold": 1200,
                "view": 9000,
                "category": { "_id": "cat-1", "name": "Áo" },
                "createdAt": "2021-05-27T10:32:33.620Z",
                "updatedAt": "2021-05-27T10:32:33.620Z"
            },
            "createdAt": "2021-06-01T08:00:00.000Z",
            "updatedAt": "2021-06-01T08:00:00.000Z"
        });

        let purchase: Purchase = serde_json::from_value(body).unwrap();
        assert_eq!(purchase.id, PurchaseId::new("pur-1"));
        assert_eq!(purchase.status, PurchaseStatus::InCart);
        assert_eq!(purchase.product.quantity, 5);
        assert_eq!(purchase.product.price, Price::from_units(100));
        assert_eq!(
            purchase.product.category.unwrap().id,
            CategoryId::new("cat-1")
        );
    }

    #[test]
    fn test_product_list_config_omits_unset_fields() {
        let config = ProductListConfig {
            sort_by: Some(SortBy::Sold),
            name: Some("áo".to_string()),
            ..ProductListConfig::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({ "page": 1, "limit": 20, "sort_by": "sold", "name": "áo" })
        );
    }

    #[test]
    fn test_auth_payload_debug_redacts_token() {
        let payload: AuthPayload = serde_json::from_value(json!({
            "access_token": "Bearer super-secret",
            "expires": 604_800,
            "user": { "_id": "u-1", "email": "a@b.vn", "roles": ["User"] }
        }))
        .unwrap();

        assert_eq!(payload.access_token.expose_secret(), "Bearer super-secret");
        let debug_output = format!("{payload:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret"));
    }

    #[test]
    fn test_user_profile_roundtrip_skips_empty_fields() {
        let user = fixtures::user("a@b.vn");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, json!({ "_id": "u-1", "email": "a@b.vn", "roles": ["User"] }));
    }
}
