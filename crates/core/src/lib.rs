//! Shoplet Core - Shared types library.
//!
//! This crate provides common types used across all Shoplet components:
//! - `storefront` - REST client, auth state and cart reconciliation
//! - `cli` - Command-line front end for browsing and managing the cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for server IDs, prices, emails, and purchase statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
