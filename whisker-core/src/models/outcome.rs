//! Fetch cycle outcome.

use serde::{Deserialize, Serialize};

use crate::models::CatRecord;

/// What one fetch cycle hands back to the presentation layer.
///
/// A failed cycle is represented by the empty outcome (`""`, `""`); the
/// reason travels separately as status text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    /// Image URL, empty when the cycle produced no image.
    pub image_url: String,
    /// Fact text, empty when the cycle failed.
    pub fact: String,
}

impl FetchOutcome {
    /// Creates a successful outcome.
    pub fn new(image_url: impl Into<String>, fact: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            fact: fact.into(),
        }
    }

    /// The outcome of a failed cycle.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if both fields are empty.
    pub fn is_empty(&self) -> bool {
        self.image_url.is_empty() && self.fact.is_empty()
    }

    /// Returns true if there is an image to display.
    ///
    /// The presentation layer clears its image whenever this is false.
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

impl From<&CatRecord> for FetchOutcome {
    fn from(record: &CatRecord) -> Self {
        Self::new(record.image_url(), record.fact())
    }
}
