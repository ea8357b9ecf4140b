//! API Module
//!
//! HTTP handlers and routing for the proxy.
//!
//! # Endpoints
//! - `/__pokevault/*` - Local vault API (session, collection, cache stats)
//! - anything else - Intercepted and answered by the cache manager

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, API_PREFIX};
