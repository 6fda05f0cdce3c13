//! Session label generation.

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default prefix for generated session labels.
pub const DEFAULT_PREFIX: &str = "User_";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 8;

/// Identifier generated once per application run and stamped on every
/// record created during that run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLabel(String);

impl SessionLabel {
    /// Generates a label with the default prefix.
    pub fn generate() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Generates a label: `prefix` followed by 8 random alphanumerics.
    pub fn with_prefix(prefix: &str) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("{prefix}{suffix}"))
    }

    /// Wraps an existing label without generating anything.
    pub fn from_raw(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionLabel {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
