//! Shoplet storefront client library.
//!
//! Talks to the Shoplet REST backend and keeps the client-side state a
//! shopper sees: the signed-in session, the cart with its selections and
//! in-flight quantity edits, and cached catalog reads.
//!
//! Start from [`state::AppState`], which wires the API client, the auth
//! store and the cart together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod format;
pub mod forms;
pub mod services;
pub mod session;
pub mod slug;
pub mod state;
pub mod storage;
