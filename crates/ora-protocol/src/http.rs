use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Statuses worth repeating a request for.
pub const RETRY_STATUSES: [u16; 6] = [418, 429, 500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRY_STATUSES.contains(&status)
}

/// Per-request HTTP settings shared by every vendor client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    pub timeout_secs: u64,
    /// Extra attempts after the first, for transient failures only.
    pub retries: u32,
    /// Base delay; attempt `n` waits `backoff_ms * 2^(n-1)`.
    pub backoff_ms: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 3,
            backoff_ms: 500,
        }
    }
}

impl HttpOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// A `reqwest` client with a timeout and a small retry loop.
///
/// This is the library-level retry layer. It knows nothing about content or
/// providers; orchestration retries sit above it.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    options: HttpOptions,
}

impl HttpTransport {
    pub fn new(options: HttpOptions) -> ProtocolResult<Self> {
        let client = Client::builder().timeout(options.timeout()).build()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &HttpOptions {
        &self.options
    }

    /// Send the request produced by `build`, retrying transient failures.
    ///
    /// `build` runs once per attempt, so bodies that cannot be cloned (such
    /// as multipart forms) are rebuilt each time. Non-success statuses that
    /// are not retried come back as [`ProtocolError::Status`].
    pub async fn send<F>(&self, build: F) -> ProtocolResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let retries_left = attempt < self.options.retries;
            match build(&self.client).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let url = resp.url().to_string();
                    if !(retries_left && is_retryable_status(status)) {
                        return Err(ProtocolError::Status { url, status });
                    }
                    tracing::debug!(url = %url, status, attempt, "retrying request");
                }
                Err(e) => {
                    if !(retries_left && (e.is_connect() || e.is_timeout())) {
                        return Err(e.into());
                    }
                    tracing::debug!(error = %e, attempt, "retrying request");
                }
            }
            attempt += 1;
            tokio::time::sleep(self.options.backoff(attempt)).await;
        }
    }

    pub async fn get_bytes(&self, url: &str) -> ProtocolResult<bytes::Bytes> {
        let resp = self.send(|c| c.get(url)).await?;
        Ok(resp.bytes().await?)
    }
}

/// Join `base` and `path` with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fast, serve};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Route that fails with `status` until it has been hit `failures` times.
    fn flaky(failures: usize, status: StatusCode, hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/data",
            get(move || {
                let hits = hits.clone();
                async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < failures {
                        (status, "busy")
                    } else {
                        (StatusCode::OK, "payload")
                    }
                }
            }),
        )
    }

    #[test]
    fn retry_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(501));
    }

    #[test]
    fn backoff_doubles() {
        let opts = HttpOptions {
            backoff_ms: 100,
            ..HttpOptions::default()
        };
        assert_eq!(opts.backoff(1), Duration::from_millis(100));
        assert_eq!(opts.backoff(2), Duration::from_millis(200));
        assert_eq!(opts.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn join_url_single_slash() {
        assert_eq!(join_url("http://a/", "/ipfs/x"), "http://a/ipfs/x");
        assert_eq!(join_url("http://a", "ipfs/x"), "http://a/ipfs/x");
    }

    #[tokio::test]
    async fn retries_transient_status() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(flaky(2, StatusCode::SERVICE_UNAVAILABLE, hits.clone())).await;
        let transport = HttpTransport::new(fast(3)).unwrap();

        let body = transport.get_bytes(&format!("{base}/data")).await.unwrap();
        assert_eq!(&body[..], b"payload");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(flaky(10, StatusCode::TOO_MANY_REQUESTS, hits.clone())).await;
        let transport = HttpTransport::new(fast(2)).unwrap();

        let err = transport.get_bytes(&format!("{base}/data")).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Status { status: 429, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_final() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(flaky(10, StatusCode::NOT_FOUND, hits.clone())).await;
        let transport = HttpTransport::new(fast(3)).unwrap();

        let err = transport.get_bytes(&format!("{base}/data")).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Status { status: 404, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
