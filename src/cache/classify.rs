//! Request classification.

use axum::http::{HeaderMap, Method};
use bytes::Bytes;

/// How the caller issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level page load
    Navigate,
    /// Script, stylesheet, image, API call
    Subresource,
}

impl RequestMode {
    /// Reads the `Sec-Fetch-Mode` header; anything but `navigate` is a subresource.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()) {
            Some(mode) if mode.eq_ignore_ascii_case("navigate") => RequestMode::Navigate,
            _ => RequestMode::Subresource,
        }
    }
}

/// A request caught on its way to the network.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: Method,
    pub url: String,
    pub mode: RequestMode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InterceptedRequest {
    /// Body-less `GET` for `url`.
    pub fn get(url: impl Into<String>, mode: RequestMode) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            mode,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Caching strategy bucket of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Network first, shell on failure
    Navigation,
    /// Stale-while-revalidate
    Idempotent,
    /// Passed through untouched
    Mutating,
}

/// First match wins: method, then mode.
pub fn classify(request: &InterceptedRequest) -> RequestClass {
    if request.method != Method::GET {
        return RequestClass::Mutating;
    }
    match request.mode {
        RequestMode::Navigate => RequestClass::Navigation,
        RequestMode::Subresource => RequestClass::Idempotent,
    }
}
