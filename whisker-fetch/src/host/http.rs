//! HTTP client with tracing, timeouts and status mapping.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - A per-request timeout surfaced as [`FetchError::Timeout`]
//! - Mapping of non-success statuses to typed errors

use reqwest::{Client, Response, StatusCode, header, header::HeaderMap};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FetchError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for Whisker.
const USER_AGENT: &str = concat!("Whisker/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt kept in a status error.
const MAX_DETAIL_LEN: usize = 200;

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and status mapping.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be set up.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be set up.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: client,
            timeout,
        })
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a GET request and fails on any non-success status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    /// Performs a GET request with custom headers.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<Response, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        debug!("GET request");

        let response = self
            .inner
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        debug!(status = %response.status(), "Response received");

        check_status(response).await
    }

    /// Performs a GET request and returns the body as text.
    pub async fn get_text(&self, url: &str, headers: HeaderMap) -> Result<String, FetchError> {
        let response = self.get_with_headers(url, headers).await?;
        response.text().await.map_err(|e| self.map_transport_error(e))
    }

    /// Performs a GET request and returns the raw body bytes.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        Ok(bytes.to_vec())
    }

    fn map_transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs())
        } else {
            FetchError::Http(err)
        }
    }
}

/// Turns a non-success response into a typed error.
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if response.is_rate_limited() {
        let retry_after = response.retry_after_secs();
        warn!(?retry_after, "Rate limited");
        return Err(FetchError::RateLimited { retry_after });
    }

    let reason = status.canonical_reason().unwrap_or("Unknown status");
    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        reason.to_string()
    } else {
        excerpt(body.trim())
    };

    warn!(status = status.as_u16(), "Non-success response");
    Err(FetchError::Status {
        status: status.as_u16(),
        detail,
    })
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= MAX_DETAIL_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_DETAIL_LEN).collect();
        format!("{cut}...")
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================
