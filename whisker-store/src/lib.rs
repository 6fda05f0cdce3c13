// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Whisker Store
//!
//! State and storage for the Whisker application.
//!
//! This crate provides:
//!
//! - **RecordStore**: Append-only, observable history of fetched records,
//!   written through to a file one record at a time
//! - **Persistence**: The injected write/read capability and its file
//!   implementation
//! - **SettingsStore**: User preferences with persistence
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use whisker_store::{FilePersistence, RecordStore, default_history_path};
//!
//! let store = RecordStore::new(Arc::new(FilePersistence::new()), default_history_path());
//! store.append(record).await?;
//!
//! let mut rx = store.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("History now has {} records", store.len().await);
//! }
//! ```

pub mod error;
pub mod persistence;
pub mod record_store;
pub mod settings_store;

pub use error::StoreError;
pub use persistence::{
    FilePersistence, Persistence, default_config_dir, default_data_dir, default_history_path,
    default_settings_path, ensure_dir, load_json, save_json,
};
pub use record_store::{EXAMPLE_COUNT, RecordStore};
pub use settings_store::{LogLevel, Settings, SettingsStore};
