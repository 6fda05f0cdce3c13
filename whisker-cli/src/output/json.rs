//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use whisker_core::{CatRecord, FetchOutcome, SessionLabel};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one fetch cycle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutput {
    pub ok: bool,
    pub image_url: String,
    pub fact: String,
    pub status: String,
    pub owner_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_error: Option<String>,
}

impl FetchOutput {
    pub fn new(outcome: &FetchOutcome, status: &str, session: &SessionLabel) -> Self {
        Self {
            ok: !outcome.is_empty(),
            image_url: outcome.image_url.clone(),
            fact: outcome.fact.clone(),
            status: status.to_string(),
            owner_label: session.as_str().to_string(),
            saved_image: None,
            image_error: None,
        }
    }

    pub fn with_saved_image(mut self, path: Option<&Path>) -> Self {
        self.saved_image = path.map(|p| p.display().to_string());
        self
    }

    pub fn with_image_error(mut self, error: Option<String>) -> Self {
        self.image_error = error;
        self
    }
}

/// JSON output for the history command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOutput {
    pub path: String,
    pub count: usize,
    pub records: Vec<CatRecord>,
}

impl HistoryOutput {
    pub fn new(path: &Path, records: Vec<CatRecord>) -> Self {
        Self {
            path: path.display().to_string(),
            count: records.len(),
            records,
        }
    }
}

// ============================================================================
// Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Serializes any output value.
    pub fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}
