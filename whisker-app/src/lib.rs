// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Whisker App
//!
//! The fetch-and-record workflow behind every Whisker front end.
//!
//! [`FetchWorkflow`] owns one fetch cycle: it asks the injected
//! [`CatSource`](whisker_fetch::CatSource) for an image URL and a fact,
//! records the result in the [`RecordStore`](whisker_store::RecordStore),
//! and turns every failure into status text. Presentation layers observe:
//!
//! - the current status text ([`FetchWorkflow::subscribe_status`])
//! - the cycle phase ([`FetchWorkflow::subscribe_phase`])
//! - the history ([`RecordStore::subscribe`](whisker_store::RecordStore::subscribe))

pub mod error;
pub mod workflow;

pub use error::{
    CANCELLED_MESSAGE, FETCHING_MESSAGE, FailureKind, GENERIC_PREFIX, REMOTE_PREFIX,
    WorkflowError,
};
pub use workflow::{FetchPhase, FetchWorkflow, WorkflowConfig};
