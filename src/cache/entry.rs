//! Cache Entry Module
//!
//! Request identity and the response snapshots stored against it.

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use url::Url;

// == Request Key ==
/// Normalized identity of a request: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: normalize_url(url),
        }
    }

    /// Key of a plain `GET` for `url`.
    pub fn get(url: &str) -> Self {
        Self::new(Method::GET, url)
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Canonical URL form; unparseable input is kept as given.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.to_string(),
    }
}

// == Response Snapshot ==
/// A complete response as received from the network.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// When the response arrived
    pub fetched_at: DateTime<Utc>,
}

impl ResponseSnapshot {
    // == Constructor ==
    /// Creates a snapshot stamped with the current time.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Only plain `200 OK` responses are worth storing.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Age of the snapshot in milliseconds.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_milliseconds().max(0)
    }
}
