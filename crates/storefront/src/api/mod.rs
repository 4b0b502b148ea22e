//! Storefront REST API client.
//!
//! # Architecture
//!
//! - `reqwest` for HTTP, one shared connection pool per [`ApiClient`]
//! - The backend is the source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog and purchase queries
//! - Requests carry the stored access token verbatim in `Authorization`
//!
//! # Example
//!
//! ```rust,ignore
//! use shoplet_storefront::api::{ApiClient, ProductListConfig};
//!
//! let client = ApiClient::new(&config, auth.clone())?;
//!
//! let page = client.get_products(&ProductListConfig::default()).await?;
//! let product = client.get_product(&page.products[0].id).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use cache::{QueryCache, QueryKey, QueryValue};
pub use client::ApiClient;
pub use types::*;

use std::collections::BTreeMap;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected one or more form fields (HTTP 422).
    #[error("Validation failed: {message}")]
    UnprocessableEntity {
        /// Top-level message.
        message: String,
        /// Field name to error message, as sent by the backend.
        fields: BTreeMap<String, String>,
    },

    /// Missing, expired or rejected access token (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Backend message, or a truncated body.
        message: String,
    },
}

impl ApiError {
    /// Whether this is a field-validation failure.
    #[must_use]
    pub const fn is_unprocessable_entity(&self) -> bool {
        matches!(self, Self::UnprocessableEntity { .. })
    }

    /// Whether the backend rejected the access token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Turn a 422 `data` payload into a field map.
///
/// Non-string values (nested objects some validators emit) are flattened to
/// their `msg` member when present, otherwise to their JSON text.
fn field_errors(data: Option<&serde_json::Value>) -> BTreeMap<String, String> {
    let Some(serde_json::Value::Object(map)) = data else {
        return BTreeMap::new();
    };

    map.iter()
        .map(|(field, value)| {
            let message = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Object(inner) => inner
                    .get("msg")
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(|| value.to_string(), str::to_owned),
                other => other.to_string(),
            };
            (field.clone(), message)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("products/abc".to_string());
        assert_eq!(err.to_string(), "Not found: products/abc");

        let err = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway: upstream down");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_error_classification() {
        let err = ApiError::UnprocessableEntity {
            message: "Lỗi".to_string(),
            fields: BTreeMap::new(),
        };
        assert!(err.is_unprocessable_entity());
        assert!(!err.is_unauthorized());
        assert!(ApiError::Unauthorized("expired".to_string()).is_unauthorized());
    }

    #[test]
    fn test_field_errors_flattening() {
        let data = json!({
            "email": "Email đã tồn tại",
            "password": { "msg": "Mật khẩu quá ngắn", "value": "123" },
            "age": 3
        });
        let fields = field_errors(Some(&data));
        assert_eq!(fields["email"], "Email đã tồn tại");
        assert_eq!(fields["password"], "Mật khẩu quá ngắn");
        assert_eq!(fields["age"], "3");
    }

    #[test]
    fn test_field_errors_non_object() {
        assert!(field_errors(None).is_empty());
        assert!(field_errors(Some(&json!("oops"))).is_empty());
    }
}
