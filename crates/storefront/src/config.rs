//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPLET_API_URL` - Base URL of the storefront REST backend
//!
//! ## Optional
//! - `SHOPLET_STORAGE_PATH` - Durable key-value file (default: .shoplet/storage.json)
//! - `SHOPLET_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SHOPLET_CACHE_TTL_SECS` - Query cache time-to-live (default: 300)
//! - `SHOPLET_CACHE_CAPACITY` - Query cache entry limit (default: 1000)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_PATH: &str = ".shoplet/storage.json";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_CACHE_CAPACITY: &str = "1000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, always ending in `/` so relative joins append.
    pub api_url: Url,
    /// Location of the durable key-value store
    pub storage_path: PathBuf,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// Query cache configuration
    pub cache: CacheConfig,
}

/// Query cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// How long a cached response stays fresh
    pub time_to_live: Duration,
    /// Maximum number of cached responses
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            time_to_live: Duration::from_secs(300),
            max_capacity: 1000,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("SHOPLET_API_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPLET_API_URL".to_string(), e))?;
        let storage_path =
            PathBuf::from(get_env_or_default("SHOPLET_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let http_timeout = Duration::from_secs(get_parsed_env::<u64>(
            "SHOPLET_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);
        let cache = CacheConfig {
            time_to_live: Duration::from_secs(get_parsed_env::<u64>(
                "SHOPLET_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            max_capacity: get_parsed_env::<u64>("SHOPLET_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
        };

        Ok(Self {
            api_url,
            storage_path,
            http_timeout,
            cache,
        })
    }

    /// Build a configuration for a backend URL with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPLET_API_URL".to_string(), e))?;
        Ok(Self {
            api_url,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            http_timeout: Duration::from_secs(10),
            cache: CacheConfig::default(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the backend URL and make sure it ends with a slash.
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable with a default value and parse it.
fn get_parsed_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
