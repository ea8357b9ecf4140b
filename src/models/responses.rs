//! Response DTOs for the local vault API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::collection::{CollectionItem, CollectionStore};

/// Response body for the session endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Authenticated username, null when logged out
    pub username: Option<String>,
}

impl SessionResponse {
    pub fn new(username: Option<&str>) -> Self {
        Self {
            username: username.map(str::to_string),
        }
    }
}

/// Response body for `GET /__pokevault/collection`
#[derive(Debug, Clone, Serialize)]
pub struct CollectionResponse {
    pub owner: String,
    pub items: Vec<CollectionItem>,
    pub distinct_items: usize,
    pub total_copies: u64,
    pub market_value: f64,
}

impl CollectionResponse {
    pub fn from_store(owner: impl Into<String>, store: &CollectionStore) -> Self {
        Self {
            owner: owner.into(),
            items: store.items().to_vec(),
            distinct_items: store.items().len(),
            total_copies: store.total_copies(),
            market_value: store.market_value(),
        }
    }
}

/// Response body for add and decrease
#[derive(Debug, Clone, Serialize)]
pub struct QuantityResponse {
    pub item_id: String,
    /// Copies owned after the operation
    pub quantity: u32,
}

impl QuantityResponse {
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Response body for `DELETE /__pokevault/collection/items/:id`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    pub item_id: String,
    /// False when the item was not owned
    pub removed: bool,
}

impl RemoveResponse {
    pub fn new(item_id: impl Into<String>, removed: bool) -> Self {
        Self {
            item_id: item_id.into(),
            removed,
        }
    }
}

/// Response body for the stats endpoint (GET /__pokevault/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Generation currently served
    pub generation: String,
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(generation: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            generation: generation.into(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /__pokevault/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Lifecycle of the cache manager ("installing" or "active")
    pub cache: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(cache: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            cache: cache.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
