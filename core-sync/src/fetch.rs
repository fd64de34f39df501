//! # Retrying Fetch
//!
//! Wraps the host's single-attempt [`HttpClient`] with bounded exponential
//! backoff. Only transport failures are retried; any response the server
//! produced, error statuses included, ends the loop.

use crate::error::{Result, SyncError};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::BridgeError;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct RetryingFetch {
    client: Arc<dyn HttpClient>,
    policy: RetryPolicy,
}

impl RetryingFetch {
    pub fn new(client: Arc<dyn HttpClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute `request`, retrying transport failures up to the policy's
    /// attempt budget.
    ///
    /// After the `n`-th failed attempt the call sleeps `2^n` seconds (with the
    /// default base delay). No sleep follows the final attempt; the last
    /// transport error is returned as [`SyncError::Transport`].
    #[instrument(skip_all, fields(url = %request.url, method = ?request.method))]
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.client.execute(request.clone()).await {
                Ok(response) => {
                    debug!(status = response.status, attempt, "Response received");
                    return Ok(response);
                }
                Err(error @ BridgeError::Transport(_)) => {
                    if attempt >= max_attempts {
                        warn!(attempt, error = %error, "Retry budget exhausted");
                        return Err(SyncError::Transport {
                            url: request.url.clone(),
                            attempts: attempt,
                            source: error,
                        });
                    }

                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(other) => return Err(SyncError::Host(other)),
            }
        }
    }

    /// Fetch and require a 2xx status.
    pub async fn fetch_success(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        let response = self.fetch(request).await?;

        if !response.is_success() {
            return Err(SyncError::Api {
                url,
                status: response.status,
                body: response.text_lossy(),
            });
        }

        Ok(response)
    }

    /// Fetch, require a 2xx status and decode the JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let url = request.url.clone();
        let response = self.fetch_success(request).await?;

        response.json().map_err(|e| SyncError::InvalidResponse {
            url,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    fn response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn failing_then_ok(failures: u32) -> MockHttpClient {
        let calls = Arc::new(AtomicU32::new(0));
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(failures as usize + 1)
            .returning(move |_| {
                if calls.fetch_add(1, Ordering::SeqCst) < failures {
                    Err(BridgeError::Transport("connection reset".to_string()))
                } else {
                    Ok(response(200, "ok"))
                }
            });
        http
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures_with_backoff() {
        let fetch = RetryingFetch::new(Arc::new(failing_then_ok(3)), RetryPolicy::new(5));

        let started = Instant::now();
        let result = fetch.fetch(HttpRequest::get("https://cms.example.com/files")).await;
        let elapsed = started.elapsed();

        assert_eq!(result.unwrap().status, 200);
        // 2^1 + 2^2 + 2^3 seconds
        assert!(elapsed >= Duration::from_secs(14));
        assert!(elapsed < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_sleep() {
        let fetch = RetryingFetch::new(Arc::new(failing_then_ok(0)), RetryPolicy::new(5));

        let started = Instant::now();
        fetch
            .fetch(HttpRequest::get("https://cms.example.com/files"))
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_exactly_max_attempts() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(3)
            .returning(|_| Err(BridgeError::Transport("timed out".to_string())));
        let fetch = RetryingFetch::new(Arc::new(http), RetryPolicy::new(3));

        let started = Instant::now();
        let err = fetch
            .fetch(HttpRequest::get("https://cms.example.com/assets/1"))
            .await
            .unwrap_err();

        match err {
            SyncError::Transport { url, attempts, source } => {
                assert_eq!(url, "https://cms.example.com/assets/1");
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Waits after attempts 1 and 2 only
        assert!(started.elapsed() >= Duration::from_secs(6));
        assert!(started.elapsed() < Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(503, "unavailable")));
        let fetch = RetryingFetch::new(Arc::new(http), RetryPolicy::new(5));

        let raw = fetch
            .fetch(HttpRequest::get("https://cms.example.com/files"))
            .await
            .unwrap();
        assert_eq!(raw.status, 503);
    }

    #[tokio::test]
    async fn test_fetch_success_maps_error_status() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(403, "forbidden")));
        let fetch = RetryingFetch::new(Arc::new(http), RetryPolicy::new(5));

        let err = fetch
            .fetch_success(HttpRequest::get("https://cms.example.com/files"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_non_transport_bridge_error_is_not_retried() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("bad header".to_string())));
        let fetch = RetryingFetch::new(Arc::new(http), RetryPolicy::new(5));

        let err = fetch
            .fetch(HttpRequest::get("https://cms.example.com/files"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Host(_)));
    }

    #[tokio::test]
    async fn test_fetch_json_decodes_body() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, r#"{"data":[1,2,3]}"#)));
        let fetch = RetryingFetch::new(Arc::new(http), RetryPolicy::new(1));

        let body: serde_json::Value = fetch
            .fetch_json(HttpRequest::get("https://cms.example.com/files"))
            .await
            .unwrap();
        assert_eq!(body["data"][2], 3);
    }
}
