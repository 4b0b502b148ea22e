//! Unified error handling.
//!
//! Provides a unified `AppError` type for the services and the CLI. Each
//! layer keeps its own error enum; `AppError` wraps them and decides how a
//! failure is reported to the user.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::config::ConfigError;
use crate::forms::{AuthField, RegisterField};
use crate::services::auth::AuthError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Login failed.
    #[error("Login failed: {0}")]
    Login(#[from] AuthError<AuthField>),

    /// Registration failed.
    #[error("Registration failed: {0}")]
    Register(#[from] AuthError<RegisterField>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    /// Whether the backend rejected the access token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_)
                | Self::Api(ApiError::Unauthorized(_))
                | Self::Login(AuthError::Api(ApiError::Unauthorized(_)))
                | Self::Register(AuthError::Api(ApiError::Unauthorized(_)))
        )
    }

    /// Process exit code for this error.
    ///
    /// `2` for input the user can fix, `3` for missing authentication,
    /// `4` for missing resources, `1` for everything else.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_unauthorized() {
            return 3;
        }
        match self {
            Self::Config(_)
            | Self::Cart(_)
            | Self::Login(AuthError::Form(_))
            | Self::Register(AuthError::Form(_))
            | Self::Login(AuthError::Api(ApiError::UnprocessableEntity { .. }))
            | Self::Register(AuthError::Api(ApiError::UnprocessableEntity { .. }))
            | Self::Api(ApiError::UnprocessableEntity { .. }) => 2,
            Self::NotFound(_) | Self::Api(ApiError::NotFound(_)) => 4,
            _ => 1,
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormErrors;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Cart(CartError::RowNotFound(4));
        assert_eq!(err.to_string(), "Cart error: no cart row at index 4");
    }

    #[test]
    fn test_app_error_exit_codes() {
        assert_eq!(AppError::NotFound("test".to_string()).exit_code(), 4);
        assert_eq!(AppError::Unauthorized("test".to_string()).exit_code(), 3);
        assert_eq!(
            AppError::Api(ApiError::Unauthorized("expired".to_string())).exit_code(),
            3
        );
        assert_eq!(AppError::Cart(CartError::RowNotFound(0)).exit_code(), 2);
        assert_eq!(
            AppError::Login(AuthError::Form(FormErrors::new())).exit_code(),
            2
        );
        assert_eq!(
            AppError::Login(AuthError::Api(ApiError::UnprocessableEntity {
                message: "Lỗi".to_string(),
                fields: std::collections::BTreeMap::new(),
            }))
            .exit_code(),
            2
        );
        assert_eq!(AppError::Api(ApiError::RateLimited(5)).exit_code(), 1);
    }
}
