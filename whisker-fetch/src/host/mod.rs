//! Host APIs for system interactions.
//!
//! - [`http`] - HTTP client with tracing and status mapping

pub mod http;
