//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for remote fetch operations.
///
/// Everything except [`FetchError::Cancelled`] and
/// [`FetchError::InvalidConfig`] is a remote failure: the source answered
/// with a non-success status or the request never completed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed in transit (DNS, connect, reset, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status {
        /// Status code.
        status: u16,
        /// Reason phrase or a short excerpt of the body.
        detail: String,
    },

    /// Rate limited by the source.
    #[error("Rate limited (HTTP 429), retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if the source said so.
        retry_after: Option<u64>,
    },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The response carried no payload at all.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request was aborted before it completed.
    #[error("Request was cancelled")]
    Cancelled,

    /// The local source configuration cannot be used to build a request.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// Returns true if the request was aborted by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Returns true for transport and HTTP status failures.
    pub fn is_remote(&self) -> bool {
        !matches!(self, FetchError::Cancelled | FetchError::InvalidConfig(_))
    }

    /// The HTTP status this error carries, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::RateLimited { .. } => Some(429),
            FetchError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_not_remote() {
        assert!(FetchError::Cancelled.is_cancelled());
        assert!(!FetchError::Cancelled.is_remote());
    }

    #[test]
    fn test_invalid_config_is_not_remote() {
        let err = FetchError::InvalidConfig("bad key".to_string());
        assert!(!err.is_remote());
        assert!(!err.is_cancelled());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_status_codes() {
        let err = FetchError::Status {
            status: 503,
            detail: "Service Unavailable".to_string(),
        };
        assert!(err.is_remote());
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");

        let limited = FetchError::RateLimited {
            retry_after: Some(30),
        };
        assert_eq!(limited.status(), Some(429));
        assert_eq!(FetchError::Timeout(5).status(), None);
    }
}
