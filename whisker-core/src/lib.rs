// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Whisker Core
//!
//! Core types and models for the Whisker application.
//!
//! This crate provides the foundational abstractions used across all other
//! Whisker crates:
//!
//! - Domain models (records, fetch outcomes, session labels)
//! - Error types
//!
//! ## Key Types
//!
//! - [`CatRecord`] - One fetched or seeded image URL + fact observation
//! - [`FetchOutcome`] - What a single fetch cycle hands to the presentation layer
//! - [`SessionLabel`] - Per-run identifier stamped on every record

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{CatRecord, FetchOutcome, NO_FACT_FALLBACK, SessionLabel};
