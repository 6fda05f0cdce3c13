// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Whisker Fetch
//!
//! HTTP access to the remote cat sources.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing, timeouts and status mapping
//!
//! ## Sources
//!
//! - [`source::CatSource`] - Trait the fetch workflow depends on
//! - [`source::RemoteCatSource`] - Implementation backed by the public APIs
//! - [`parser`] - Typed parsing of the image-search and fact payloads
//!
//! ## Example
//!
//! ```ignore
//! use whisker_fetch::{CatSource, CatSourceConfig, RemoteCatSource};
//!
//! let source = RemoteCatSource::new(CatSourceConfig::default())?;
//! let url = source.fetch_random_image_url().await?;
//! let fact = source.fetch_random_fact().await?;
//! ```

pub mod error;
pub mod host;
pub mod parser;
pub mod source;

// Errors
pub use error::FetchError;

// Host APIs
pub use host::http::{HttpClient, ResponseExt};

// Sources
pub use source::{
    CatSource, CatSourceConfig, DEFAULT_FACT_ENDPOINT, DEFAULT_IMAGE_ENDPOINT, RemoteCatSource,
    validate_api_key,
};
