//! Business logic services for the storefront client.
//!
//! # Services
//!
//! - `auth` - Login, registration and logout against the backend session
//! - `cart` - Cart refresh, quantity edits, bulk delete and checkout
//! - `catalog` - Product and category browsing
//!
//! Services borrow the handles they need from [`AppState`](crate::state::AppState)
//! and are cheap to construct per operation.

pub mod auth;
pub mod cart;
pub mod catalog;

pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::CatalogService;
