//! Remote cat sources.
//!
//! [`CatSource`] is the seam the fetch workflow depends on;
//! [`RemoteCatSource`] implements it against the public image-search and
//! fact APIs. No retries and no caching happen here: every failure is
//! returned to the caller as a [`FetchError`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::{debug, instrument};

use whisker_core::NO_FACT_FALLBACK;

use crate::error::FetchError;
use crate::host::http::{DEFAULT_TIMEOUT_SECS, HttpClient};
use crate::parser::{parse_fact, parse_image_url};

// ============================================================================
// Constants
// ============================================================================

/// Image-search endpoint.
pub const DEFAULT_IMAGE_ENDPOINT: &str = "https://api.thecatapi.com/v1/images/search";

/// Fact endpoint.
pub const DEFAULT_FACT_ENDPOINT: &str = "https://catfact.ninja/fact";

/// Header carrying the optional image API key.
const API_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// Source Trait
// ============================================================================

/// A source of random cat image URLs, cat facts and image bytes.
#[async_trait]
pub trait CatSource: Send + Sync {
    /// Fetches one random image URL. Empty if the source returned none.
    async fn fetch_random_image_url(&self) -> Result<String, FetchError>;

    /// Fetches one random fact, or [`NO_FACT_FALLBACK`] if the source
    /// returned none.
    async fn fetch_random_fact(&self) -> Result<String, FetchError>;

    /// Fetches the raw bytes behind an image URL.
    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Endpoints and request options for [`RemoteCatSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatSourceConfig {
    /// Image-search endpoint URL.
    pub image_endpoint: String,
    /// Fact endpoint URL.
    pub fact_endpoint: String,
    /// Optional API key sent to the image-search endpoint.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for CatSourceConfig {
    fn default() -> Self {
        Self {
            image_endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            fact_endpoint: DEFAULT_FACT_ENDPOINT.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl CatSourceConfig {
    /// Sets the image-search endpoint.
    #[must_use]
    pub fn with_image_endpoint(mut self, url: impl Into<String>) -> Self {
        self.image_endpoint = url.into();
        self
    }

    /// Sets the fact endpoint.
    #[must_use]
    pub fn with_fact_endpoint(mut self, url: impl Into<String>) -> Self {
        self.fact_endpoint = url.into();
        self
    }

    /// Sets the image API key. Blank keys are ignored.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Checks that `key` can be sent as the image API key header.
///
/// # Errors
///
/// Returns [`FetchError::InvalidConfig`] if the key contains characters a
/// header value cannot carry.
pub fn validate_api_key(key: &str) -> Result<(), FetchError> {
    api_key_value(key).map(|_| ())
}

fn api_key_value(key: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(key)
        .map_err(|e| FetchError::InvalidConfig(format!("API key is not a valid header value: {e}")))
}

// ============================================================================
// Remote Source
// ============================================================================

/// [`CatSource`] backed by HTTPS JSON endpoints.
#[derive(Debug, Clone)]
pub struct RemoteCatSource {
    http: HttpClient,
    config: CatSourceConfig,
}

impl RemoteCatSource {
    /// Creates a source with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: CatSourceConfig) -> Result<Self, FetchError> {
        let http = HttpClient::with_timeout(config.timeout)?;
        Ok(Self { http, config })
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn image_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = Self::json_headers();
        if let Some(key) = &self.config.api_key {
            headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key_value(key)?);
        }
        Ok(headers)
    }
}

#[async_trait]
impl CatSource for RemoteCatSource {
    #[instrument(skip(self))]
    async fn fetch_random_image_url(&self) -> Result<String, FetchError> {
        let body = self
            .http
            .get_text(&self.config.image_endpoint, self.image_headers()?)
            .await?;
        let url = parse_image_url(&body)?.unwrap_or_default();
        debug!(found = !url.is_empty(), "Image URL fetched");
        Ok(url)
    }

    #[instrument(skip(self))]
    async fn fetch_random_fact(&self) -> Result<String, FetchError> {
        let body = self
            .http
            .get_text(&self.config.fact_endpoint, Self::json_headers())
            .await?;
        let fact = parse_fact(&body)?;
        debug!(found = fact.is_some(), "Fact fetched");
        Ok(fact.unwrap_or_else(|| NO_FACT_FALLBACK.to_string()))
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self.http.get_bytes(url).await?;
        debug!(len = bytes.len(), "Image downloaded");
        Ok(bytes)
    }
}
