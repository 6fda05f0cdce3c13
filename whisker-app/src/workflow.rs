//! Fetch-and-record workflow.
//!
//! One cycle moves `Idle -> Fetching -> {Succeeded, Failed} -> Idle`. The
//! workflow never returns an error from [`FetchWorkflow::fetch`]: every
//! path ends in a [`FetchOutcome`] plus a status-text update.

use futures::future;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use whisker_core::{CatRecord, FetchOutcome, SessionLabel};
use whisker_fetch::CatSource;
use whisker_store::RecordStore;

use crate::error::{FETCHING_MESSAGE, WorkflowError};

// ============================================================================
// Phase & Config
// ============================================================================

/// Where the current cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// No cycle running.
    #[default]
    Idle,
    /// Waiting on the remote sources or the store.
    Fetching,
    /// The last cycle produced a record.
    Succeeded,
    /// The last cycle failed.
    Failed,
}

/// Workflow options.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowConfig {
    /// Request the image URL and the fact concurrently.
    ///
    /// The two calls have no data dependency; by default they run one
    /// after the other, image first.
    pub parallel: bool,
}

/// Counts in-flight cycles for as long as it lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }

    fn enter_exclusive(counter: &'a AtomicUsize) -> Option<Self> {
        counter
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(counter))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Fetch Workflow
// ============================================================================

/// View-model for fetching cats.
///
/// Holds no cross-cycle state beyond the session label and its
/// collaborators. Overlapping [`fetch`](Self::fetch) calls are not
/// serialized; use [`try_fetch`](Self::try_fetch) to reject a second
/// trigger while one cycle is running.
pub struct FetchWorkflow {
    source: Arc<dyn CatSource>,
    store: Arc<RecordStore>,
    session: SessionLabel,
    config: WorkflowConfig,
    status: watch::Sender<String>,
    phase: watch::Sender<FetchPhase>,
    in_flight: AtomicUsize,
}

impl FetchWorkflow {
    /// Creates a workflow with a freshly generated session label.
    pub fn new(source: Arc<dyn CatSource>, store: Arc<RecordStore>) -> Self {
        let (status, _) = watch::channel(String::new());
        let (phase, _) = watch::channel(FetchPhase::Idle);
        Self {
            source,
            store,
            session: SessionLabel::generate(),
            config: WorkflowConfig::default(),
            status,
            phase,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Uses `session` instead of the generated label.
    #[must_use]
    pub fn with_session(mut self, session: SessionLabel) -> Self {
        self.session = session;
        self
    }

    /// Sets workflow options.
    #[must_use]
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Label stamped on every record of this session.
    pub fn session(&self) -> &SessionLabel {
        &self.session
    }

    /// The history this workflow appends to.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Adds the example records to the history.
    pub async fn seed_examples(&self) -> usize {
        self.store.seed_examples(&self.session).await
    }

    // ========================================================================
    // Observable
    // ========================================================================

    /// Current status text.
    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    /// Subscribes to status text changes.
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status.subscribe()
    }

    /// Current phase.
    pub fn phase(&self) -> FetchPhase {
        *self.phase.borrow()
    }

    /// Subscribes to phase changes.
    pub fn subscribe_phase(&self) -> watch::Receiver<FetchPhase> {
        self.phase.subscribe()
    }

    /// Returns true while at least one cycle is running.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn publish(&self, phase: FetchPhase, status: &str) {
        self.status.send_replace(status.to_string());
        self.phase.send_replace(phase);
    }

    // ========================================================================
    // Fetch Cycle
    // ========================================================================

    /// Runs one fetch cycle.
    pub async fn fetch(&self) -> FetchOutcome {
        self.fetch_until(future::pending::<()>()).await
    }

    /// Runs one fetch cycle, cancelled as soon as `cancel` completes.
    pub async fn fetch_until<C>(&self, cancel: C) -> FetchOutcome
    where
        C: Future<Output = ()>,
    {
        let _guard = InFlight::enter(&self.in_flight);
        self.cycle(cancel).await
    }

    /// Runs one fetch cycle unless another one is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Busy`] without touching status or history
    /// when a cycle is already running.
    pub async fn try_fetch(&self) -> Result<FetchOutcome, WorkflowError> {
        let Some(_guard) = InFlight::enter_exclusive(&self.in_flight) else {
            debug!("Fetch rejected, cycle in flight");
            return Err(WorkflowError::Busy);
        };
        Ok(self.cycle(future::pending::<()>()).await)
    }

    #[instrument(skip(self, cancel), fields(session = %self.session))]
    async fn cycle<C>(&self, cancel: C) -> FetchOutcome
    where
        C: Future<Output = ()>,
    {
        self.publish(FetchPhase::Fetching, FETCHING_MESSAGE);

        let result = tokio::select! {
            biased;
            result = self.fetch_and_record() => result,
            () = cancel => Err(WorkflowError::Cancelled),
        };

        let outcome = match result {
            Ok(record) => {
                info!(image = %record.image_url(), "Fetch succeeded");
                self.publish(FetchPhase::Succeeded, record.fact());
                FetchOutcome::from(&record)
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Fetch failed");
                self.publish(FetchPhase::Failed, &e.status_message());
                FetchOutcome::empty()
            }
        };

        self.phase.send_replace(FetchPhase::Idle);
        outcome
    }

    async fn fetch_and_record(&self) -> Result<CatRecord, WorkflowError> {
        let (image_url, fact) = if self.config.parallel {
            tokio::try_join!(
                self.source.fetch_random_image_url(),
                self.source.fetch_random_fact()
            )?
        } else {
            let image_url = self.source.fetch_random_image_url().await?;
            let fact = self.source.fetch_random_fact().await?;
            (image_url, fact)
        };

        let record = CatRecord::new(image_url, fact, &self.session);
        self.store.append(record.clone()).await?;
        Ok(record)
    }

    // ========================================================================
    // Image
    // ========================================================================

    /// Downloads the image behind an outcome.
    ///
    /// Returns `Ok(None)` when the outcome has no image, so the caller
    /// clears its display.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Remote`] or [`WorkflowError::Cancelled`]
    /// if the download fails.
    pub async fn load_image(&self, outcome: &FetchOutcome) -> Result<Option<Vec<u8>>, WorkflowError> {
        if !outcome.has_image() {
            return Ok(None);
        }
        let bytes = self.source.fetch_image_bytes(&outcome.image_url).await?;
        Ok(Some(bytes))
    }
}

impl std::fmt::Debug for FetchWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchWorkflow")
            .field("session", &self.session)
            .field("config", &self.config)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
