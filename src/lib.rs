//! Pokevault - Offline-first proxy for a trading-card browser
//!
//! Intercepts the browser's requests with a versioned response cache and
//! keeps each user's card collection in a local vault.

pub mod api;
pub mod auth;
pub mod cache;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod vault;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{Result, VaultError};
pub use vault::Vault;
