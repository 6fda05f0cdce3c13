//! Fetch workflow tests with stub collaborators.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use whisker_core::{FetchOutcome, NO_FACT_FALLBACK, SessionLabel};
use whisker_fetch::{CatSource, FetchError};
use whisker_store::{EXAMPLE_COUNT, Persistence, RecordStore};
use whisker_app::{
    CANCELLED_MESSAGE, FETCHING_MESSAGE, FetchPhase, FetchWorkflow, GENERIC_PREFIX,
    REMOTE_PREFIX, WorkflowConfig, WorkflowError,
};

// ============================================================================
// Stubs
// ============================================================================

type Reply = Result<String, FetchError>;

/// Replays queued replies and records which calls were made.
#[derive(Default)]
struct StubSource {
    images: Mutex<VecDeque<Reply>>,
    facts: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<&'static str>>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
}

impl StubSource {
    fn new() -> Self {
        Self::default()
    }

    fn image(self, reply: Reply) -> Self {
        self.images.lock().unwrap().push_back(reply);
        self
    }

    fn fact(self, reply: Reply) -> Self {
        self.facts.lock().unwrap().push_back(reply);
        self
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn next(queue: &Mutex<VecDeque<Reply>>) -> Reply {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::InvalidResponse("no reply queued".to_string())))
    }
}

#[async_trait]
impl CatSource for StubSource {
    async fn fetch_random_image_url(&self) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push("image");
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Self::next(&self.images)
    }

    async fn fetch_random_fact(&self) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push("fact");
        Self::next(&self.facts)
    }

    async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push("bytes");
        Ok(url.as_bytes().to_vec())
    }
}

/// Keeps writes in memory; optionally fails every write.
#[derive(Default)]
struct MemoryPersistence {
    writes: Mutex<Vec<(PathBuf, String)>>,
    fail: bool,
}

impl MemoryPersistence {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
        if self.fail {
            return Err(std::io::Error::other("disk is read-only"));
        }
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));
        Ok(())
    }

    async fn read_all(&self, _path: &Path) -> std::io::Result<String> {
        Ok(String::new())
    }
}

struct Harness {
    source: Arc<StubSource>,
    persistence: Arc<MemoryPersistence>,
    workflow: Arc<FetchWorkflow>,
}

fn harness(source: StubSource, persistence: MemoryPersistence) -> Harness {
    harness_with(source, persistence, WorkflowConfig::default())
}

fn harness_with(
    source: StubSource,
    persistence: MemoryPersistence,
    config: WorkflowConfig,
) -> Harness {
    let source = Arc::new(source);
    let persistence = Arc::new(persistence);
    let store = Arc::new(RecordStore::new(persistence.clone(), "/tmp/whisker-history.jsonl"));
    let workflow = FetchWorkflow::new(source.clone(), store)
        .with_session(SessionLabel::from_raw("User_Test1234"))
        .with_config(config);

    Harness {
        source,
        persistence,
        workflow: Arc::new(workflow),
    }
}

fn ok(s: &str) -> Reply {
    Ok(s.to_string())
}

fn rate_limited() -> Reply {
    Err(FetchError::RateLimited {
        retry_after: Some(60),
    })
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn test_success_returns_values_and_records_once() {
    let h = harness(
        StubSource::new()
            .image(ok("https://cdn2.thecatapi.com/images/a1.jpg"))
            .fact(ok("Cats have 32 muscles in each ear.")),
        MemoryPersistence::default(),
    );
    let start = Utc::now();

    let outcome = h.workflow.fetch().await;

    assert_eq!(
        outcome,
        FetchOutcome::new(
            "https://cdn2.thecatapi.com/images/a1.jpg",
            "Cats have 32 muscles in each ear."
        )
    );

    let records = h.workflow.store().all().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.image_url(), "https://cdn2.thecatapi.com/images/a1.jpg");
    assert_eq!(record.fact(), "Cats have 32 muscles in each ear.");
    assert_eq!(record.owner_label(), "User_Test1234");
    assert!(record.captured_at_time() >= start);

    assert_eq!(h.persistence.write_count(), 1);
    assert_eq!(h.workflow.status(), "Cats have 32 muscles in each ear.");
    assert_eq!(h.workflow.phase(), FetchPhase::Idle);
    assert_eq!(h.source.calls(), vec!["image", "fact"]);
}

#[tokio::test]
async fn test_empty_fact_recorded_as_fallback() {
    let h = harness(
        StubSource::new().image(ok("https://x/1.jpg")).fact(ok("")),
        MemoryPersistence::default(),
    );

    let outcome = h.workflow.fetch().await;

    let record = h.workflow.store().latest().await.unwrap();
    assert_eq!(record.fact(), NO_FACT_FALLBACK);
    assert_eq!(outcome.fact, NO_FACT_FALLBACK);
}

#[tokio::test]
async fn test_two_fetches_append_in_call_order() {
    let h = harness(
        StubSource::new()
            .image(ok("https://x/1.jpg"))
            .fact(ok("first"))
            .image(ok("https://x/2.jpg"))
            .fact(ok("second")),
        MemoryPersistence::default(),
    );

    let first = h.workflow.fetch().await;
    let second = h.workflow.fetch().await;

    assert_ne!(first, second);
    let records = h.workflow.store().all().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].image_url(), "https://x/1.jpg");
    assert_eq!(records[1].image_url(), "https://x/2.jpg");
    assert_eq!(h.persistence.write_count(), 2);
}

#[tokio::test]
async fn test_parallel_fetch_calls_both_sources() {
    let h = harness_with(
        StubSource::new().image(ok("https://x/p.jpg")).fact(ok("parallel")),
        MemoryPersistence::default(),
        WorkflowConfig { parallel: true },
    );

    let outcome = h.workflow.fetch().await;

    assert_eq!(outcome, FetchOutcome::new("https://x/p.jpg", "parallel"));
    let mut calls = h.source.calls();
    calls.sort_unstable();
    assert_eq!(calls, vec!["fact", "image"]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_remote_error_on_image() {
    let h = harness(
        StubSource::new().image(rate_limited()).fact(ok("never used")),
        MemoryPersistence::default(),
    );

    let outcome = h.workflow.fetch().await;

    assert_eq!(outcome, FetchOutcome::new("", ""));
    assert!(h.workflow.store().is_empty().await);
    assert_eq!(h.persistence.write_count(), 0);
    assert_eq!(h.source.calls(), vec!["image"]);

    let status = h.workflow.status();
    assert!(status.starts_with(REMOTE_PREFIX));
    assert!(status.contains("429"));
    assert_ne!(status, CANCELLED_MESSAGE);
    assert!(!status.starts_with(GENERIC_PREFIX));
    assert_eq!(h.workflow.phase(), FetchPhase::Idle);
}

#[tokio::test]
async fn test_remote_error_on_fact_records_nothing() {
    let h = harness(
        StubSource::new().image(ok("https://x/1.jpg")).fact(Err(FetchError::Status {
            status: 500,
            detail: "Internal Server Error".to_string(),
        })),
        MemoryPersistence::default(),
    );

    let outcome = h.workflow.fetch().await;

    assert!(outcome.is_empty());
    assert!(h.workflow.store().is_empty().await);
    assert!(h.workflow.status().contains("Internal Server Error"));
}

#[tokio::test]
async fn test_cancelled_source_uses_fixed_message() {
    let h = harness(
        StubSource::new().image(Err(FetchError::Cancelled)),
        MemoryPersistence::default(),
    );

    let outcome = h.workflow.fetch().await;

    assert!(outcome.is_empty());
    assert_eq!(h.workflow.status(), CANCELLED_MESSAGE);
    assert!(h.workflow.store().is_empty().await);
}

#[tokio::test]
async fn test_caller_cancellation() {
    let h = harness(
        StubSource::new()
            .image(ok("https://x/late.jpg"))
            .fact(ok("too late"))
            .slow(Duration::from_secs(30)),
        MemoryPersistence::default(),
    );

    let outcome = h
        .workflow
        .fetch_until(tokio::time::sleep(Duration::from_millis(20)))
        .await;

    assert!(outcome.is_empty());
    assert_eq!(h.workflow.status(), CANCELLED_MESSAGE);
    assert!(h.workflow.store().is_empty().await);
    assert!(!h.workflow.is_fetching());
}

#[tokio::test]
async fn test_persistence_failure_keeps_record() {
    let h = harness(
        StubSource::new().image(ok("https://x/1.jpg")).fact(ok("kept")),
        MemoryPersistence::failing(),
    );

    let outcome = h.workflow.fetch().await;

    assert!(outcome.is_empty());
    let records = h.workflow.store().all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fact(), "kept");

    let status = h.workflow.status();
    assert!(status.starts_with(GENERIC_PREFIX));
    assert!(status.contains("disk is read-only"));
}

// ============================================================================
// Observable State & Concurrency
// ============================================================================

#[tokio::test]
async fn test_fetching_status_published_before_network_completes() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        StubSource::new()
            .image(ok("https://x/g.jpg"))
            .fact(ok("gated"))
            .gated(gate.clone()),
        MemoryPersistence::default(),
    );
    let mut phase = h.workflow.subscribe_phase();

    let workflow = h.workflow.clone();
    let task = tokio::spawn(async move { workflow.fetch().await });

    phase
        .wait_for(|p| *p == FetchPhase::Fetching)
        .await
        .unwrap();
    assert_eq!(h.workflow.status(), FETCHING_MESSAGE);
    assert!(h.workflow.is_fetching());

    gate.notify_one();
    let outcome = task.await.unwrap();

    assert_eq!(outcome.fact, "gated");
    assert!(!h.workflow.is_fetching());
}

#[tokio::test]
async fn test_try_fetch_rejects_overlap() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        StubSource::new()
            .image(ok("https://x/1.jpg"))
            .fact(ok("one"))
            .gated(gate.clone()),
        MemoryPersistence::default(),
    );
    let mut phase = h.workflow.subscribe_phase();

    let workflow = h.workflow.clone();
    let task = tokio::spawn(async move { workflow.try_fetch().await });
    phase
        .wait_for(|p| *p == FetchPhase::Fetching)
        .await
        .unwrap();

    let second = h.workflow.try_fetch().await;
    assert!(matches!(second, Err(WorkflowError::Busy)));
    assert_eq!(h.workflow.status(), FETCHING_MESSAGE);

    gate.notify_one();
    let first = task.await.unwrap().unwrap();
    assert_eq!(first.fact, "one");
    assert_eq!(h.workflow.store().len().await, 1);
}

#[tokio::test]
async fn test_overlapping_fetches_both_append() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        StubSource::new()
            .image(ok("https://x/a.jpg"))
            .fact(ok("a"))
            .image(ok("https://x/b.jpg"))
            .fact(ok("b"))
            .gated(gate.clone()),
        MemoryPersistence::default(),
    );

    let first = tokio::spawn({
        let workflow = h.workflow.clone();
        async move { workflow.fetch().await }
    });
    let second = tokio::spawn({
        let workflow = h.workflow.clone();
        async move { workflow.fetch().await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.source.calls().len() < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(h.workflow.is_fetching());

    gate.notify_waiters();
    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert!(!first.is_empty());
    assert!(!second.is_empty());
    assert_ne!(first, second);
    assert_eq!(h.workflow.store().len().await, 2);
    assert_eq!(h.persistence.write_count(), 2);
    assert!(!h.workflow.is_fetching());
}

#[tokio::test]
async fn test_history_subscribers_notified() {
    let h = harness(
        StubSource::new().image(ok("https://x/1.jpg")).fact(ok("seen")),
        MemoryPersistence::default(),
    );
    let history = h.workflow.store().subscribe();

    h.workflow.fetch().await;

    assert!(history.has_changed().unwrap());
}

// ============================================================================
// Seeding & Images
// ============================================================================

#[tokio::test]
async fn test_seed_examples_uses_session_and_never_writes() {
    let h = harness(StubSource::new(), MemoryPersistence::default());

    let added = h.workflow.seed_examples().await;

    assert_eq!(added, EXAMPLE_COUNT);
    assert_eq!(h.workflow.store().len().await, 3);
    assert_eq!(h.persistence.write_count(), 0);
    let records = h.workflow.store().all().await;
    assert!(records.iter().all(|r| r.owner_label() == "User_Test1234"));
}

#[tokio::test]
async fn test_load_image() {
    let h = harness(StubSource::new(), MemoryPersistence::default());

    let none = h.workflow.load_image(&FetchOutcome::empty()).await.unwrap();
    assert!(none.is_none());
    assert!(h.source.calls().is_empty());

    let bytes = h
        .workflow
        .load_image(&FetchOutcome::new("https://x/img.jpg", "f"))
        .await
        .unwrap();
    assert_eq!(bytes.as_deref(), Some("https://x/img.jpg".as_bytes()));
}

#[test]
fn test_generated_session_label() {
    let store = Arc::new(RecordStore::new(
        Arc::new(MemoryPersistence::default()),
        "/tmp/h.jsonl",
    ));
    let workflow = FetchWorkflow::new(Arc::new(StubSource::new()), store);
    assert!(workflow.session().as_str().starts_with("User_"));
}

// ============================================================================
// File-Backed History
// ============================================================================

#[tokio::test]
async fn test_records_written_to_history_file() {
    use whisker_store::FilePersistence;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("history.jsonl");
    let store = Arc::new(RecordStore::new(Arc::new(FilePersistence::new()), &path));
    let source = StubSource::new()
        .image(ok("https://x/1.jpg"))
        .fact(ok("one"))
        .image(ok("https://x/2.jpg"))
        .fact(ok(""));
    let workflow = FetchWorkflow::new(Arc::new(source), store)
        .with_session(SessionLabel::from_raw("User_File0001"));

    workflow.fetch().await;
    workflow.fetch().await;

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(r#"{"imageUrl":"https://x/1.jpg","fact":"one","ownerLabel":"User_File0001","capturedAt":""#));
    assert!(lines[1].contains(r#""fact":"No fact available.""#));

    let reloaded = RecordStore::load_persisted(&FilePersistence::new(), &path)
        .await
        .unwrap();
    assert_eq!(reloaded, workflow.store().all().await);
}
