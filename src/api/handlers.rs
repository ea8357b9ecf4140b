//! API Handlers
//!
//! The interception proxy handler plus the local vault endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::HeaderValue,
    response::Response,
    Json,
};
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::cache::{
    end_to_end_headers, CacheManager, Intercepted, InterceptedRequest, Lifecycle, RequestMode,
    SOURCE_HEADER,
};
use crate::collection::CatalogItem;
use crate::error::{Result, VaultError};
use crate::models::{
    CollectionResponse, CredentialsRequest, HealthResponse, QuantityResponse, RemoveResponse,
    SessionResponse, StatsResponse,
};
use crate::vault::Vault;

/// Application state shared across all handlers.
///
/// The vault sits behind a mutex so its operations run one at a time, in
/// arrival order.
#[derive(Clone)]
pub struct AppState {
    /// Interception cache in front of the upstream
    pub manager: Arc<CacheManager>,
    /// Credentials, session and collection
    pub vault: Arc<Mutex<Vault>>,
    /// Origin proxied requests are sent to
    pub upstream: Url,
    /// Largest request body buffered for forwarding
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(manager: CacheManager, vault: Vault, upstream: Url, max_body_bytes: usize) -> Self {
        Self {
            manager: Arc::new(manager),
            vault: Arc::new(Mutex::new(vault)),
            upstream,
            max_body_bytes,
        }
    }
}

/// Fallback handler: every request not addressed to the vault API.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| VaultError::InvalidRequest(format!("unreadable body: {}", e)))?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = state
        .upstream
        .join(path_and_query)
        .map_err(|e| VaultError::InvalidRequest(format!("bad request target: {}", e)))?;

    let intercepted = InterceptedRequest {
        method: parts.method,
        url: url.to_string(),
        mode: RequestMode::from_headers(&parts.headers),
        headers: parts.headers,
        body,
    };

    let outcome = state.manager.respond(intercepted).await?;
    debug!("Answered {} from {}", url, outcome.source.as_str());
    Ok(into_http_response(outcome))
}

fn into_http_response(outcome: Intercepted) -> Response {
    let Intercepted {
        response, source, ..
    } = outcome;

    let mut http = Response::new(Body::from(response.body));
    *http.status_mut() = response.status;
    *http.headers_mut() = end_to_end_headers(&response.headers);
    http.headers_mut()
        .insert(SOURCE_HEADER, HeaderValue::from_static(source.as_str()));
    http
}

/// Handler for POST /__pokevault/register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(VaultError::InvalidRequest(error_msg));
    }

    let mut vault = state.vault.lock().await;
    vault.register(&req.username, &req.password)?;
    Ok(Json(SessionResponse::new(vault.current_user())))
}

/// Handler for POST /__pokevault/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(VaultError::InvalidRequest(error_msg));
    }

    let mut vault = state.vault.lock().await;
    vault.login(&req.username, &req.password)?;
    Ok(Json(SessionResponse::new(vault.current_user())))
}

/// Handler for POST /__pokevault/logout
pub async fn logout_handler(State(state): State<AppState>) -> Result<Json<SessionResponse>> {
    let mut vault = state.vault.lock().await;
    vault.logout()?;
    Ok(Json(SessionResponse::new(None)))
}

/// Handler for GET /__pokevault/session
pub async fn session_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    let vault = state.vault.lock().await;
    Json(SessionResponse::new(vault.current_user()))
}

/// Handler for GET /__pokevault/collection
pub async fn collection_handler(
    State(state): State<AppState>,
) -> Result<Json<CollectionResponse>> {
    let vault = state.vault.lock().await;
    let owner = vault.session_owner()?;
    Ok(Json(CollectionResponse::from_store(owner, vault.collection())))
}

/// Handler for POST /__pokevault/collection/items
pub async fn add_item_handler(
    State(state): State<AppState>,
    Json(item): Json<CatalogItem>,
) -> Result<Json<QuantityResponse>> {
    if item.id.is_empty() {
        return Err(VaultError::InvalidRequest("Item id cannot be empty".to_string()));
    }

    let mut vault = state.vault.lock().await;
    vault.session_owner()?;
    let item_id = item.id.clone();
    let quantity = vault.collection_mut().add(item)?;
    Ok(Json(QuantityResponse::new(item_id, quantity)))
}

/// Handler for POST /__pokevault/collection/items/:id/decrease
pub async fn decrease_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<QuantityResponse>> {
    let mut vault = state.vault.lock().await;
    vault.session_owner()?;
    let quantity = vault.collection_mut().decrease(&item_id)?;
    Ok(Json(QuantityResponse::new(item_id, quantity)))
}

/// Handler for DELETE /__pokevault/collection/items/:id
pub async fn remove_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<RemoveResponse>> {
    let mut vault = state.vault.lock().await;
    vault.session_owner()?;
    let removed = vault.collection_mut().remove_all(&item_id)?;
    Ok(Json(RemoveResponse::new(item_id, removed)))
}

/// Handler for GET /__pokevault/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.manager.stats().await;
    Json(StatsResponse::new(state.manager.generation(), stats))
}

/// Handler for GET /__pokevault/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = match state.manager.lifecycle() {
        Lifecycle::Installing => "installing",
        Lifecycle::Active { .. } => "active",
    };
    Json(HealthResponse::healthy(cache))
}
