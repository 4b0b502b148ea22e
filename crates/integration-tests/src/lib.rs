//! Integration test support for Shoplet.
//!
//! Every test runs the storefront client against a `wiremock` server that
//! plays the backend, with the session persisted to a file in a temporary
//! directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shoplet-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::MockServer;

use shoplet_storefront::config::StorefrontConfig;
use shoplet_storefront::state::AppState;
use shoplet_storefront::storage::FileStore;

/// A mocked backend plus a client state wired to it.
pub struct TestContext {
    pub server: MockServer,
    pub state: AppState,
    /// Keeps the storage directory alive for the test's duration.
    pub dir: TempDir,
}

impl TestContext {
    /// Start a mock backend and a client with empty storage.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let state = open_state(&server, &dir.path().join("storage.json"));
        Self { server, state, dir }
    }

    /// Path of the storage file.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.dir.path().join("storage.json")
    }

    /// A second client sharing this one's storage file, as after a restart.
    #[must_use]
    pub fn reopen(&self) -> AppState {
        open_state(&self.server, &self.storage_path())
    }
}

fn open_state(server: &MockServer, storage_path: &std::path::Path) -> AppState {
    let mut config = StorefrontConfig::for_api_url(&server.uri()).unwrap();
    config.storage_path = storage_path.to_path_buf();
    let storage = FileStore::open(storage_path).unwrap();
    AppState::new(config, Arc::new(storage)).unwrap()
}

/// `{ message, data }` success envelope.
#[must_use]
pub fn envelope(message: &str, data: Value) -> Value {
    json!({ "message": message, "data": data })
}

/// Backend JSON for a product.
#[must_use]
pub fn product_json(id: &str, price: u64, price_before_discount: u64, quantity: u32) -> Value {
    json!({
        "_id": id,
        "name": format!("Product {id}"),
        "image": format!("https://cdn.example.com/{id}.jpg"),
        "images": [],
        "price": price,
        "price_before_discount": price_before_discount,
        "quantity": quantity,
        "rating": 4.5,
        "sold": 1200,
        "view": 5000,
        "category": { "_id": "c1", "name": "Phones" },
        "createdAt": "2021-05-27T15:00:00.000Z",
        "updatedAt": "2021-05-27T15:00:00.000Z"
    })
}

/// Backend JSON for an in-cart purchase of product `p-{id}`.
#[must_use]
pub fn purchase_json(id: &str, buy_count: u32, price: u64, stock: u32) -> Value {
    json!({
        "_id": id,
        "buy_count": buy_count,
        "price": price,
        "price_before_discount": price,
        "status": -1,
        "user": "u-1",
        "product": product_json(&format!("p-{id}"), price, price, stock),
        "createdAt": "2021-06-01T10:00:00.000Z",
        "updatedAt": "2021-06-01T10:00:00.000Z"
    })
}

/// Backend JSON for a login or register payload.
#[must_use]
pub fn auth_json(token: &str, email: &str) -> Value {
    envelope(
        "Đăng nhập thành công",
        json!({
            "access_token": token,
            "expires": 604_800,
            "user": {
                "_id": "u-1",
                "email": email,
                "roles": ["User"],
                "createdAt": "2021-06-01T10:00:00.000Z",
                "updatedAt": "2021-06-01T10:00:00.000Z"
            }
        }),
    )
}
