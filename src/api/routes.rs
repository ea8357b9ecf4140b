//! API Routes
//!
//! Configures the Axum router: the vault API under `/__pokevault`, and the
//! interception proxy for everything else.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_item_handler, collection_handler, decrease_item_handler, health_handler, login_handler,
    logout_handler, proxy_handler, register_handler, remove_item_handler, session_handler,
    stats_handler, AppState,
};

/// Path prefix reserved for the vault API
pub const API_PREFIX: &str = "/__pokevault";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /__pokevault/health` - Health check
/// - `GET /__pokevault/stats` - Cache statistics
/// - `POST /__pokevault/register`, `/login`, `/logout`, `GET /session`
/// - `GET /__pokevault/collection` - Current user's collection
/// - `POST /__pokevault/collection/items` - Add one copy
/// - `POST /__pokevault/collection/items/:id/decrease` - Remove one copy
/// - `DELETE /__pokevault/collection/items/:id` - Remove every copy
/// - anything else - intercepted and answered by the cache manager
///
/// CORS applies to the vault API only; proxied responses keep the
/// upstream's headers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/session", get(session_handler))
        .route("/collection", get(collection_handler))
        .route("/collection/items", post(add_item_handler))
        .route("/collection/items/:id/decrease", post(decrease_item_handler))
        .route("/collection/items/:id", delete(remove_item_handler))
        .layer(cors);

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
