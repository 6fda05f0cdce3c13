//! Typed parsing of the remote payloads.
//!
//! Each parse step yields an explicit `Option` per consumed field. A body
//! with the wrong shape counts as "no value found"; only a body that is
//! missing entirely is an error.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;

/// One element of the image-search response array. Other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ImageSearchItem {
    /// Image URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// The fact response object. Other fields (e.g. `length`) are ignored.
#[derive(Debug, Deserialize)]
pub struct FactResponse {
    /// Fact text.
    #[serde(default)]
    pub fact: Option<String>,
}

fn ensure_payload(body: &str, what: &str) -> Result<(), FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::InvalidResponse(format!("empty {what} response")));
    }
    Ok(())
}

/// Extracts the first image URL from an image-search response.
///
/// Returns `Ok(None)` for an empty array, a missing/null/empty `url`, or a
/// body that does not have the expected shape.
///
/// # Errors
///
/// Returns [`FetchError::InvalidResponse`] if the body is empty.
pub fn parse_image_url(body: &str) -> Result<Option<String>, FetchError> {
    ensure_payload(body, "image search")?;
    debug!(len = body.len(), "Parsing image search response");

    let items: Vec<ImageSearchItem> = match serde_json::from_str(body) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "Unexpected image search payload");
            return Ok(None);
        }
    };

    Ok(items
        .into_iter()
        .next()
        .and_then(|item| item.url)
        .filter(|url| !url.trim().is_empty()))
}

/// Extracts the fact text from a fact response.
///
/// Returns `Ok(None)` for a missing/null/blank `fact` or a body that does
/// not have the expected shape.
///
/// # Errors
///
/// Returns [`FetchError::InvalidResponse`] if the body is empty.
pub fn parse_fact(body: &str) -> Result<Option<String>, FetchError> {
    ensure_payload(body, "fact")?;
    debug!(len = body.len(), "Parsing fact response");

    let response: FactResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Unexpected fact payload");
            return Ok(None);
        }
    };

    Ok(response.fact.filter(|fact| !fact.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_url() {
        let json = r#"[{
            "id": "MTY3ODIyMQ",
            "url": "https://cdn2.thecatapi.com/images/MTY3ODIyMQ.jpg",
            "width": 1204,
            "height": 1445
        }]"#;
        assert_eq!(
            parse_image_url(json).unwrap().as_deref(),
            Some("https://cdn2.thecatapi.com/images/MTY3ODIyMQ.jpg")
        );
    }

    #[test]
    fn test_parse_image_url_uses_first_element() {
        let json = r#"[{"url": "https://a.example/1.jpg"}, {"url": "https://a.example/2.jpg"}]"#;
        assert_eq!(
            parse_image_url(json).unwrap().as_deref(),
            Some("https://a.example/1.jpg")
        );
    }

    #[test]
    fn test_parse_image_url_missing_values() {
        assert_eq!(parse_image_url("[]").unwrap(), None);
        assert_eq!(parse_image_url(r#"[{"id": "x"}]"#).unwrap(), None);
        assert_eq!(parse_image_url(r#"[{"url": null}]"#).unwrap(), None);
        assert_eq!(parse_image_url(r#"[{"url": ""}]"#).unwrap(), None);
    }

    #[test]
    fn test_parse_image_url_wrong_shape() {
        assert_eq!(parse_image_url(r#"{"url": "https://x"}"#).unwrap(), None);
        assert_eq!(parse_image_url("<html>oops</html>").unwrap(), None);
    }

    #[test]
    fn test_parse_image_url_empty_body() {
        assert!(matches!(
            parse_image_url("  "),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_fact() {
        let json = r#"{"fact": "Cats have five toes on their front paws.", "length": 40}"#;
        assert_eq!(
            parse_fact(json).unwrap().as_deref(),
            Some("Cats have five toes on their front paws.")
        );
    }

    #[test]
    fn test_parse_fact_missing_values() {
        assert_eq!(parse_fact("{}").unwrap(), None);
        assert_eq!(parse_fact(r#"{"fact": null}"#).unwrap(), None);
        assert_eq!(parse_fact(r#"{"fact": "  "}"#).unwrap(), None);
        assert_eq!(parse_fact("[1, 2]").unwrap(), None);
    }

    #[test]
    fn test_parse_fact_empty_body() {
        assert!(parse_fact("").is_err());
    }
}
