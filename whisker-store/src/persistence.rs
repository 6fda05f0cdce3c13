//! File persistence helpers.
//!
//! Provides the [`Persistence`] capability the record store writes through,
//! its file-backed implementation, default paths, and JSON helpers for the
//! settings file.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/Whisker`
/// - Linux: `~/.config/whisker`
/// - Windows: `%APPDATA%\whisker`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support").join("Whisker"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .map(|c| c.join("whisker"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the default data directory (where history lives).
///
/// - macOS: same as the config directory
/// - Linux: `~/.local/share/whisker`
/// - Windows: `%APPDATA%\whisker`
pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        default_config_dir()
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::data_dir()
            .map(|d| d.join("whisker"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Returns the default history file path.
pub fn default_history_path() -> PathBuf {
    default_data_dir().join("history.jsonl")
}

// ============================================================================
// Persistence Capability
// ============================================================================

/// Write/read capability the record store is given at construction.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Writes `content` to `path`.
    async fn write(&self, path: &Path, content: &str) -> std::io::Result<()>;

    /// Reads everything stored at `path`.
    async fn read_all(&self, path: &Path) -> std::io::Result<String>;
}

/// File-backed [`Persistence`].
///
/// `write` appends `content` as one newline-terminated line, creating the
/// file and its parent directories on first use, so every record lands in
/// the file individually.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePersistence;

impl FilePersistence {
    /// Creates a file persistence handle.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        let mut line = String::with_capacity(content.len() + 1);
        line.push_str(content.trim_end_matches('\n'));
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), bytes = line.len(), "Appended line");
        Ok(())
    }

    async fn read_all(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

// ============================================================================
// JSON Files
// ============================================================================

/// Saves data to a JSON file.
///
/// Creates parent directories if they don't exist and writes atomically
/// (via temp file + rename).
///
/// # Errors
///
/// Returns [`StoreError::Io`] or [`StoreError::Serialization`].
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), "JSON file saved");
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] or [`StoreError::Serialization`].
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;

    Ok(data)
}

/// Ensures a directory exists.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be created.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !path.as_os_str().is_empty() && !path.exists() {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
