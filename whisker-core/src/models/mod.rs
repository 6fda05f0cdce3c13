//! Domain models for Whisker.
//!
//! ## Submodules
//!
//! - [`record`] - The persisted record type
//! - [`outcome`] - Result of one fetch cycle
//! - [`session`] - Session label generation

mod outcome;
mod record;
mod session;

pub use outcome::FetchOutcome;
pub use record::{CatRecord, NO_FACT_FALLBACK};
pub use session::SessionLabel;
