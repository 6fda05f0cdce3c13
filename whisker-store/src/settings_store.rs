//! User preferences store.
//!
//! Manages user settings and their JSON file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use whisker_fetch::{
    CatSourceConfig, DEFAULT_FACT_ENDPOINT, DEFAULT_IMAGE_ENDPOINT, validate_api_key,
};

use crate::error::StoreError;
use crate::persistence::{default_history_path, default_settings_path, load_json, save_json};

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Image-search endpoint.
    pub image_endpoint: String,

    /// Fact endpoint.
    pub fact_endpoint: String,

    /// Optional API key for the image-search endpoint.
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// History file override. `None` uses [`default_history_path`].
    pub history_path: Option<PathBuf>,

    /// Prefix of the generated session label.
    pub owner_prefix: String,

    /// Fetch image and fact concurrently instead of one after the other.
    pub parallel_fetch: bool,

    /// Show the example records when a session starts with no history.
    pub seed_examples: bool,

    /// Log level.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_endpoint: DEFAULT_IMAGE_ENDPOINT.to_string(),
            fact_endpoint: DEFAULT_FACT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 30,
            history_path: None,
            owner_prefix: "User_".to_string(),
            parallel_fetch: false,
            seed_examples: true,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Keys accepted by [`Settings::set`].
    pub const KEYS: &'static [&'static str] = &[
        "image_endpoint",
        "fact_endpoint",
        "api_key",
        "timeout_secs",
        "history_path",
        "owner_prefix",
        "parallel_fetch",
        "seed_examples",
        "log_level",
    ];

    /// The history file in effect.
    pub fn history_path(&self) -> PathBuf {
        self.history_path.clone().unwrap_or_else(default_history_path)
    }

    /// Builds the remote source configuration.
    pub fn source_config(&self) -> CatSourceConfig {
        CatSourceConfig::default()
            .with_image_endpoint(&self.image_endpoint)
            .with_fact_endpoint(&self.fact_endpoint)
            .with_api_key(self.api_key.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs.max(1)))
    }

    /// Sets a single setting from its textual form.
    ///
    /// An empty value clears the optional settings (`api_key`,
    /// `history_path`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for unknown keys and invalid values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = value.trim();
        match key {
            "image_endpoint" => self.image_endpoint = non_empty(key, value)?,
            "fact_endpoint" => self.fact_endpoint = non_empty(key, value)?,
            "api_key" => {
                let api_key = optional(value);
                if let Some(api_key) = &api_key {
                    validate_api_key(api_key)
                        .map_err(|e| StoreError::Config(format!("{key}: {e}")))?;
                }
                self.api_key = api_key;
            }
            "timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| StoreError::Config(format!("{key}: not a number: {value}")))?;
                if secs == 0 {
                    return Err(StoreError::Config(format!("{key}: must be at least 1")));
                }
                self.timeout_secs = secs;
            }
            "history_path" => self.history_path = optional(value).map(PathBuf::from),
            "owner_prefix" => self.owner_prefix = value.to_string(),
            "parallel_fetch" => self.parallel_fetch = parse_bool(key, value)?,
            "seed_examples" => self.seed_examples = parse_bool(key, value)?,
            "log_level" => self.log_level = value.parse()?,
            _ => {
                return Err(StoreError::Config(format!(
                    "unknown setting '{key}' (expected one of: {})",
                    Self::KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, StoreError> {
    if value.is_empty() {
        return Err(StoreError::Config(format!("{key}: must not be empty")));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, StoreError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(StoreError::Config(format!("{key}: not a boolean: {value}"))),
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(StoreError::Config(format!("unknown log level: {other}"))),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Settings with persistence.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a settings store with defaults.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible so callers handle future IO errors.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Currently infallible; a missing or unreadable file yields defaults.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self::with_settings(path, settings))
    }

    /// Path of the settings file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings in place.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Sets one setting by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for unknown keys and invalid values;
    /// nothing changes in that case.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut settings = self.settings.write().await;
        let mut updated = settings.clone();
        updated.set(key, value)?;
        *settings = updated;
        Ok(())
    }

    /// Restores defaults.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

}

// ============================================================================
// Tests
// ============================================================================
