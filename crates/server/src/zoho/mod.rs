//! Zoho Inventory API integration.
//!
//! # Components
//!
//! - [`auth::TokenProvider`] - refresh-token exchange for a short-lived bearer
//! - [`client::ZohoClient`] - paginated list fetching
//! - [`normalize`] - raw JSON to typed column values
//! - [`resources`] - per-resource descriptors driving the pipeline

pub mod auth;
pub mod client;
pub mod normalize;
pub mod resources;

use std::future::Future;

use thiserror::Error;

use crate::config::RetryPolicy;

pub use auth::TokenProvider;
pub use client::ZohoClient;
pub use resources::ResourceDescriptor;

/// Errors that can occur when talking to Zoho.
#[derive(Debug, Error)]
pub enum ZohoError {
    /// Transport error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from a list endpoint.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Token exchange failed (bad status or error body).
    #[error("Zoho authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Response body was not the JSON we expected.
    #[error("invalid JSON from Zoho: {0}")]
    Json(#[from] serde_json::Error),

    /// Page body did not contain the resource's record array.
    #[error("response from {endpoint} has no '{key}' array")]
    MissingArrayKey { endpoint: String, key: String },
}

impl ZohoError {
    /// Connect failures and timeouts are the only retryable errors.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout())
    }
}

/// Run `op` under `policy`, retrying only [`ZohoError::is_retryable`] failures.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, ZohoError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ZohoError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    attempts,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    "{what} timed out, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ZohoError::Status {
            endpoint: "/items".to_string(),
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "/items returned HTTP 401: unauthorized");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_non_transport_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(
            RetryPolicy::new(3, Duration::ZERO),
            "token exchange",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ZohoError::AuthenticationFailed("invalid_code".into())) }
            },
        )
        .await;

        assert!(matches!(result, Err(ZohoError::AuthenticationFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_retries_connect_errors() {
        let client = reqwest::Client::new();
        let calls = AtomicU32::new(0);
        // Port 1 on loopback refuses connections.
        let result = with_retry(RetryPolicy::new(3, Duration::ZERO), "page fetch", || {
            calls.fetch_add(1, Ordering::SeqCst);
            let request = client.get("http://127.0.0.1:1/items");
            async move { Ok::<_, ZohoError>(request.send().await?.status()) }
        })
        .await;

        assert!(result.is_err_and(|e| e.is_retryable()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
