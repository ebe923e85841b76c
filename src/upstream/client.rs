//! Nomad HTTP API client using blocking queries.
//!
//! Each call is `GET {addr}/v1/<endpoint>?index=<n>&wait=<secs>s`. Nomad
//! holds the request open until the resource changes past `index` or
//! `wait` elapses, then answers with the body and an `X-Nomad-Index`
//! header carrying the new index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::source::{PollOutcome, ResourceSource};
use crate::domain::{Watermark, WatchedKind};
use crate::error::UpstreamError;

/// Response header holding the blocking-query index.
pub const INDEX_HEADER: &str = "X-Nomad-Index";

/// Added on top of the server-side wait before the client gives up.
const TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// [`ResourceSource`] backed by a Nomad agent.
#[derive(Debug, Clone)]
pub struct NomadClient {
    http: reqwest::Client,
    base: String,
    wait: Duration,
}

impl NomadClient {
    /// Builds a client for the agent at `address` (e.g.
    /// `http://127.0.0.1:4646`) that asks Nomad to block for up to `wait`.
    ///
    /// The HTTP timeout is `wait` plus Nomad's own jitter (`wait / 16`) and
    /// a small grace period, so a request only times out client-side when
    /// the server failed to answer its own deadline.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidAddress`] if `address` is not a URL,
    /// or [`UpstreamError::Transport`] if the HTTP client cannot be built.
    pub fn new(address: &str, wait: Duration) -> Result<Self, UpstreamError> {
        let base = address.trim_end_matches('/').to_string();
        Url::parse(&base).map_err(|e| UpstreamError::InvalidAddress(format!("{base}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(wait.saturating_add(wait / 16).saturating_add(TIMEOUT_GRACE))
            .build()?;

        Ok(Self { http, base, wait })
    }

    /// Base address requests are issued against.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.base
    }

    /// Builds the blocking-query URL for `kind` at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidAddress`] if the base address cannot
    /// carry a path.
    pub fn request_url(&self, kind: &WatchedKind, index: Watermark) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| UpstreamError::InvalidAddress(format!("{}: {e}", self.base)))?;
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidAddress(format!("{}: cannot be a base", self.base)))?
            .pop_if_empty()
            .push("v1")
            .extend(kind.path_segments());
        url.query_pairs_mut()
            .append_pair("index", &index.get().to_string())
            .append_pair("wait", &format!("{}s", self.wait.as_secs()));
        Ok(url)
    }
}

#[async_trait]
impl ResourceSource for NomadClient {
    async fn fetch(
        &self,
        kind: &WatchedKind,
        index: Watermark,
    ) -> Result<PollOutcome, UpstreamError> {
        let url = self.request_url(kind, index)?;
        tracing::trace!(%kind, %index, "issuing blocking query");

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(PollOutcome::TimedOut),
            Err(e) => return Err(UpstreamError::Transport(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let next = parse_index(response.headers().get(INDEX_HEADER))?;

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if e.is_timeout() => return Ok(PollOutcome::TimedOut),
            Err(e) => return Err(UpstreamError::Transport(e)),
        };
        let payload = serde_json::from_slice(&bytes)?;

        Ok(PollOutcome::Fetched {
            payload,
            index: next,
        })
    }
}

/// Reads the change index out of the response header.
fn parse_index(header: Option<&reqwest::header::HeaderValue>) -> Result<Watermark, UpstreamError> {
    header
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Watermark::new)
        .ok_or(UpstreamError::MissingIndex)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client() -> NomadClient {
        let Ok(client) = NomadClient::new("http://nomad.local:4646/", Duration::from_secs(60))
        else {
            panic!("valid address");
        };
        client
    }

    #[test]
    fn rejects_garbage_address() {
        let result = NomadClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(UpstreamError::InvalidAddress(_))));
    }

    #[test]
    fn trims_trailing_slash() {
        assert_eq!(client().address(), "http://nomad.local:4646");
    }

    #[test]
    fn list_url_carries_index_and_wait() {
        let Ok(url) = client().request_url(&WatchedKind::Allocations, Watermark::new(5)) else {
            panic!("url should build");
        };
        assert_eq!(url.path(), "/v1/allocations");
        assert_eq!(url.query(), Some("index=5&wait=60s"));
    }

    #[test]
    fn info_url_addresses_single_resource() {
        let kind = WatchedKind::Job("web-frontend".to_string());
        let Ok(url) = client().request_url(&kind, Watermark::ZERO) else {
            panic!("url should build");
        };
        assert_eq!(url.path(), "/v1/job/web-frontend");
        assert_eq!(url.query(), Some("index=0&wait=60s"));
    }

    #[test]
    fn resource_id_cannot_escape_its_endpoint() {
        let kind = WatchedKind::Job("../agent/self".to_string());
        let Ok(url) = client().request_url(&kind, Watermark::ZERO) else {
            panic!("url should build");
        };
        assert_eq!(url.path(), "/v1/job/..%2Fagent%2Fself");
        assert_eq!(url.query(), Some("index=0&wait=60s"));
    }

    #[test]
    fn resource_id_cannot_inject_query_or_fragment() {
        let query = WatchedKind::Job("web?namespace=prod".to_string());
        let Ok(url) = client().request_url(&query, Watermark::new(3)) else {
            panic!("url should build");
        };
        assert_eq!(url.path(), "/v1/job/web%3Fnamespace=prod");
        assert_eq!(url.query(), Some("index=3&wait=60s"));

        let fragment = WatchedKind::Node("x#frag".to_string());
        let Ok(url) = client().request_url(&fragment, Watermark::ZERO) else {
            panic!("url should build");
        };
        assert_eq!(url.path(), "/v1/node/x%23frag");
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn base_path_is_kept() {
        let Ok(client) = NomadClient::new("http://proxy.local/nomad/", Duration::from_secs(5))
        else {
            panic!("valid address");
        };
        let Ok(url) = client.request_url(&WatchedKind::Nodes, Watermark::ZERO) else {
            panic!("url should build");
        };
        assert_eq!(url.path(), "/nomad/v1/nodes");
    }

    #[test]
    fn huge_wait_does_not_overflow_timeout() {
        let result = NomadClient::new("http://nomad.local:4646", Duration::from_secs(u64::MAX));
        assert!(result.is_ok());
    }

    #[test]
    fn parses_index_header() {
        let value = HeaderValue::from_static("42");
        let Ok(index) = parse_index(Some(&value)) else {
            panic!("header should parse");
        };
        assert_eq!(index, Watermark::new(42));
    }

    #[test]
    fn missing_or_bad_index_is_an_error() {
        assert!(matches!(parse_index(None), Err(UpstreamError::MissingIndex)));
        let bad = HeaderValue::from_static("abc");
        assert!(matches!(parse_index(Some(&bad)), Err(UpstreamError::MissingIndex)));
    }

    /// Serves a fake agent on a random local port and returns a client
    /// whose HTTP timeout is far below the agent's slowest answer.
    async fn local_agent() -> NomadClient {
        use axum::Json;
        use axum::Router;
        use axum::routing::get;

        let app = Router::new()
            .route(
                "/v1/allocations",
                get(|| async { ([(INDEX_HEADER, "7")], Json(serde_json::json!([{"ID": "a-1"}]))) }),
            )
            .route(
                "/v1/nodes",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    ([(INDEX_HEADER, "8")], Json(serde_json::json!([])))
                }),
            )
            .route("/v1/jobs", get(|| async { Json(serde_json::json!([])) }))
            .route(
                "/v1/evaluations",
                get(|| async { ([(INDEX_HEADER, "9")], "<html>proxy error</html>") }),
            )
            .route(
                "/v1/job/{id}",
                get(|| async { (axum::http::StatusCode::NOT_FOUND, "job not found") }),
            );

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let Ok(http) = reqwest::Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
        else {
            panic!("http client should build");
        };
        NomadClient {
            http,
            base: format!("http://{addr}"),
            wait: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn fetch_returns_payload_and_index() {
        let client = local_agent().await;
        let outcome = client.fetch(&WatchedKind::Allocations, Watermark::ZERO).await;
        let (payload, index) = match outcome {
            Ok(PollOutcome::Fetched { payload, index }) => (payload, index),
            other => panic!("expected a fetched payload, got {other:?}"),
        };
        assert_eq!(index, Watermark::new(7));
        assert_eq!(payload[0]["ID"], "a-1");
    }

    #[tokio::test]
    async fn timed_out_long_poll_is_not_a_failure() {
        let client = local_agent().await;
        let outcome = client.fetch(&WatchedKind::Nodes, Watermark::new(8)).await;
        assert!(matches!(outcome, Ok(PollOutcome::TimedOut)), "got {outcome:?}");
    }

    #[tokio::test]
    async fn missing_index_header_is_an_error() {
        let client = local_agent().await;
        let outcome = client.fetch(&WatchedKind::Jobs, Watermark::ZERO).await;
        assert!(matches!(outcome, Err(UpstreamError::MissingIndex)), "got {outcome:?}");
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let client = local_agent().await;
        let outcome = client.fetch(&WatchedKind::Evaluations, Watermark::ZERO).await;
        assert!(matches!(outcome, Err(UpstreamError::Malformed(_))), "got {outcome:?}");
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let client = local_agent().await;
        let kind = WatchedKind::Job("gone".to_string());
        let outcome = client.fetch(&kind, Watermark::ZERO).await;
        let (status, body) = match outcome {
            Err(UpstreamError::Status { status, body }) => (status, body),
            other => panic!("expected a status error, got {other:?}"),
        };
        assert_eq!(status, 404);
        assert_eq!(body, "job not found");
    }
}
