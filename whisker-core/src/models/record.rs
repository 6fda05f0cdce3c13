//! Cat record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::SessionLabel;

/// Fact text used whenever the fact source has nothing to say.
pub const NO_FACT_FALLBACK: &str = "No fact available.";

/// One fetched (or seeded) observation: an image URL, a fact, who and when.
///
/// Records are immutable once built. Fields are private and only exposed
/// through accessors; history changes by appending new records.
///
/// The serialized field order is stable: `imageUrl`, `fact`, `ownerLabel`,
/// `capturedAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredRecord")]
pub struct CatRecord {
    image_url: String,
    fact: String,
    owner_label: String,
    captured_at: DateTime<Utc>,
}

/// Wire form of [`CatRecord`]; decoding goes through the constructor.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    image_url: String,
    #[serde(default)]
    fact: String,
    owner_label: String,
    captured_at: DateTime<Utc>,
}

impl From<StoredRecord> for CatRecord {
    fn from(stored: StoredRecord) -> Self {
        Self::captured_at(
            stored.image_url,
            stored.fact,
            stored.owner_label,
            stored.captured_at,
        )
    }
}

impl CatRecord {
    /// Creates a record stamped with the current time.
    ///
    /// An empty `fact` is replaced by [`NO_FACT_FALLBACK`].
    pub fn new(
        image_url: impl Into<String>,
        fact: impl Into<String>,
        owner: &SessionLabel,
    ) -> Self {
        Self::captured_at(image_url, fact, owner.as_str(), Utc::now())
    }

    /// Creates a record with an explicit owner label and capture time.
    pub fn captured_at(
        image_url: impl Into<String>,
        fact: impl Into<String>,
        owner_label: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let fact = fact.into();
        let fact = if fact.trim().is_empty() {
            NO_FACT_FALLBACK.to_string()
        } else {
            fact
        };

        Self {
            image_url: image_url.into(),
            fact,
            owner_label: owner_label.into(),
            captured_at,
        }
    }

    /// Absolute URL of the cat image (may be empty).
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// The fact text.
    pub fn fact(&self) -> &str {
        &self.fact
    }

    /// Session label of the run that created this record.
    pub fn owner_label(&self) -> &str {
        &self.owner_label
    }

    /// When the record was created (UTC).
    pub fn captured_at_time(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns true if the record points at an image.
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// Serializes the record to its single-line persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if JSON encoding fails.
    pub fn to_line(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a record from its single-line persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] for blank lines and
    /// [`CoreError::Serialization`] for malformed JSON.
    pub fn from_line(line: &str) -> Result<Self, CoreError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CoreError::InvalidRecord("empty line".to_string()));
        }
        Ok(serde_json::from_str(line)?)
    }
}
