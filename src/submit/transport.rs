//! Trait abstraction for the submission transport to enable mocking in tests,
//! plus the HTTP implementation used in production.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// User-Agent string for submission requests.
const USER_AGENT: &str = concat!("formbind/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout. The engine itself exposes no cancellation; a request
/// runs to completion or to this transport-level limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a completed round trip: status plus raw body, uninterpreted.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is in the success range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is in the client/server-error range recognized for
    /// error-body annotation.
    pub fn is_error_status(&self) -> bool {
        (400..600).contains(&self.status)
    }
}

/// Trait for the submission round trip, enabling mocking in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `endpoint`, returning status and raw body.
    /// An `Err` means the round trip itself failed (connect, timeout); HTTP
    /// error statuses come back as `Ok` responses.
    async fn post_json(&self, endpoint: &str, body: &serde_json::Value)
        -> Result<TransportResponse>;
}

/// HTTP transport on a shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the engine's user agent and request timeout.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint} failed"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body from {endpoint}"))?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let response = TransportResponse {
            status: 200,
            body: String::new(),
        };
        assert!(response.is_success());
        assert!(!response.is_error_status());
    }

    #[test]
    fn test_error_range_covers_client_and_server_errors() {
        for status in [400, 422, 500, 599] {
            let response = TransportResponse {
                status,
                body: String::new(),
            };
            assert!(response.is_error_status(), "status {status}");
            assert!(!response.is_success(), "status {status}");
        }
    }

    #[test]
    fn test_redirect_range_is_neither() {
        let response = TransportResponse {
            status: 304,
            body: String::new(),
        };
        assert!(!response.is_success());
        assert!(!response.is_error_status());
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new().is_ok());
    }
}
