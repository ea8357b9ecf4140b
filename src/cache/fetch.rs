//! Network seam of the cache manager.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName};
use reqwest::redirect::Policy;
use tracing::debug;

use crate::cache::{InterceptedRequest, ResponseSnapshot};
use crate::error::FetchError;

/// Headers that describe one hop and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

/// Strips hop-by-hop headers.
pub fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();
    for name in HOP_BY_HOP.iter() {
        forwarded.remove(name);
    }
    forwarded.remove("keep-alive");
    forwarded.remove("proxy-connection");
    forwarded
}

// == Fetcher Trait ==
/// Performs the real network request for an intercepted request.
///
/// Returns `Err` only when no response was obtained; HTTP error statuses are
/// ordinary responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, FetchError>;
}

// == HTTP Fetcher ==
/// [`Fetcher`] backed by a `reqwest` client. Redirects are handed back to
/// the caller rather than followed.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| FetchError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseSnapshot, FetchError> {
        debug!("Fetching {} {}", request.method, request.url);

        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(end_to_end_headers(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| FetchError(e.to_string()))?;

        let status = response.status();
        let headers = end_to_end_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError(e.to_string()))?;

        Ok(ResponseSnapshot::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RequestMode;
    use axum::http::{HeaderValue, Method, StatusCode};
    use wiremock::matchers::{body_string, header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_end_to_end_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let forwarded = end_to_end_headers(&headers);
        assert!(forwarded.get(header::HOST).is_none());
        assert!(forwarded.get(header::CONNECTION).is_none());
        assert_eq!(forwarded[header::ACCEPT], "application/json");
    }

    #[tokio::test]
    async fn test_fetch_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/cards"))
            .respond_with(ResponseTemplate::new(200).set_body_string("cards"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let request = InterceptedRequest::get(
            format!("{}/v2/cards", server.uri()),
            RequestMode::Subresource,
        );
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "cards");
    }

    #[tokio::test]
    async fn test_http_error_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let request = InterceptedRequest::get(format!("{}/missing", server.uri()), RequestMode::Subresource);
        let response = fetcher.fetch(&request).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forwards_method_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .and(header_matcher("x-api-key", "secret"))
            .and(body_string("payload"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        let request = InterceptedRequest {
            method: Method::POST,
            url: format!("{}/v2/orders", server.uri()),
            mode: RequestMode::Subresource,
            headers,
            body: "payload".into(),
        };

        let response = HttpFetcher::new().unwrap().fetch(&request).await.unwrap();
        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_redirect_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;

        let request = InterceptedRequest::get(format!("{}/old", server.uri()), RequestMode::Navigate);
        let response = HttpFetcher::new().unwrap().fetch(&request).await.unwrap();
        assert_eq!(response.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers["location"], "/new");
    }

    #[tokio::test]
    async fn test_unreachable_is_fetch_error() {
        // nothing listens on port 9 of localhost
        let request = InterceptedRequest::get("http://127.0.0.1:9/", RequestMode::Subresource);
        assert!(HttpFetcher::new().unwrap().fetch(&request).await.is_err());
    }
}
