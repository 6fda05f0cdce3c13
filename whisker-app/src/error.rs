//! Workflow errors and their user-facing messages.

use thiserror::Error;
use whisker_fetch::FetchError;
use whisker_store::StoreError;

/// Status shown while a cycle is in flight.
pub const FETCHING_MESSAGE: &str = "Fetching a new cat...";

/// Prefix of the status shown for remote failures.
pub const REMOTE_PREFIX: &str = "Network or rate-limit problem: ";

/// Status shown when a cycle was cancelled.
pub const CANCELLED_MESSAGE: &str = "The request was canceled. Please try again.";

/// Prefix of the status shown for any other failure.
pub const GENERIC_PREFIX: &str = "Something went wrong: ";

/// Failure class of a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport failure or non-success HTTP status.
    Remote,
    /// The cycle was aborted before completion.
    Cancelled,
    /// Anything else, including a failed history write.
    Other,
}

/// Errors a fetch cycle can end with.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A remote source failed.
    #[error(transparent)]
    Remote(FetchError),

    /// The cycle was cancelled.
    #[error("Request was cancelled")]
    Cancelled,

    /// The history store failed (e.g. the write-through).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A cycle is already running and the caller asked not to overlap.
    #[error("A fetch is already in progress")]
    Busy,

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl From<FetchError> for WorkflowError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => WorkflowError::Cancelled,
            FetchError::InvalidConfig(_) => WorkflowError::Other(err.to_string()),
            err => WorkflowError::Remote(err),
        }
    }
}

impl WorkflowError {
    /// Classifies the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkflowError::Remote(_) => FailureKind::Remote,
            WorkflowError::Cancelled => FailureKind::Cancelled,
            WorkflowError::Store(_) | WorkflowError::Busy | WorkflowError::Other(_) => {
                FailureKind::Other
            }
        }
    }

    /// Status text a presentation layer shows for this error.
    pub fn status_message(&self) -> String {
        match self.kind() {
            FailureKind::Remote => format!("{REMOTE_PREFIX}{self}"),
            FailureKind::Cancelled => CANCELLED_MESSAGE.to_string(),
            FailureKind::Other => format!("{GENERIC_PREFIX}{self}"),
        }
    }
}
