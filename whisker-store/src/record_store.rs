//! Observable, file-backed record history.
//!
//! The history is append-only. Every accepted record is pushed to memory,
//! subscribers are notified, and only then is the record written through
//! to the persistence capability. A failed write does not undo the append.
//! Overlapping appends reach storage in the same order as the history.

use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, info, warn};
use whisker_core::{CatRecord, SessionLabel};

use crate::error::StoreError;
use crate::persistence::Persistence;

/// Number of records [`RecordStore::seed_examples`] adds.
pub const EXAMPLE_COUNT: usize = 3;

/// Illustrative records shown on first run.
const EXAMPLES: [(&str, &str); EXAMPLE_COUNT] = [
    (
        "https://cdn2.thecatapi.com/images/0XYvRd7oD.jpg",
        "Cats spend around 70% of their lives asleep.",
    ),
    (
        "https://cdn2.thecatapi.com/images/MTY3ODIyMQ.jpg",
        "A group of cats is called a clowder.",
    ),
    (
        "https://cdn2.thecatapi.com/images/bpc.jpg",
        "A cat's nose print is unique, much like a human fingerprint.",
    ),
];

// ============================================================================
// Record Store
// ============================================================================

/// Append-only history of [`CatRecord`]s.
///
/// Observable via a watch channel carrying a change version. Readers get
/// snapshots; the only mutation is [`append`](Self::append) (and the
/// one-off [`seed_examples`](Self::seed_examples)).
pub struct RecordStore {
    records: Arc<RwLock<Vec<CatRecord>>>,
    persistence: Arc<dyn Persistence>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    /// Held from the push until its write completes.
    write_order: Mutex<()>,
}

impl RecordStore {
    /// Creates an empty store writing through to `path`.
    pub fn new(persistence: Arc<dyn Persistence>, path: impl Into<PathBuf>) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            persistence,
            path: path.into(),
            notify,
            write_order: Mutex::new(()),
        }
    }

    /// The file every appended record is written to.
    pub fn history_path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Appends a record, notifies subscribers, then persists it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the write-through fails, or
    /// [`StoreError::Record`] if the record cannot be encoded. In both
    /// cases the record stays in the in-memory history.
    pub async fn append(&self, record: CatRecord) -> Result<(), StoreError> {
        let line = record.to_line();
        let _order = self.write_order.lock().await;
        let count = {
            let mut records = self.records.write().await;
            records.push(record);
            records.len()
        };
        self.notify_change();
        debug!(count, "Record appended");

        let line = line?;
        self.persistence
            .write(&self.path, &line)
            .await
            .map_err(|source| {
                warn!(path = %self.path.display(), error = %source, "Record write failed");
                StoreError::Persistence {
                    path: self.path.clone(),
                    source,
                }
            })
    }

    /// Adds the fixed set of example records. Never writes to storage.
    ///
    /// Returns the number of records added.
    pub async fn seed_examples(&self, owner: &SessionLabel) -> usize {
        let now = Utc::now();
        let examples = EXAMPLES.iter().enumerate().map(|(i, (url, fact))| {
            let age = Duration::minutes(i64::try_from(EXAMPLE_COUNT - i).unwrap_or(0));
            CatRecord::captured_at(*url, *fact, owner.as_str(), now - age)
        });

        {
            let mut records = self.records.write().await;
            records.extend(examples);
        }
        self.notify_change();
        info!(count = EXAMPLE_COUNT, "Seeded example records");
        EXAMPLE_COUNT
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Snapshot of the whole history, oldest first.
    pub async fn all(&self) -> Vec<CatRecord> {
        self.records.read().await.clone()
    }

    /// Record at `index` (0 = oldest).
    pub async fn get(&self, index: usize) -> Option<CatRecord> {
        self.records.read().await.get(index).cloned()
    }

    /// Most recently appended record.
    pub async fn latest(&self) -> Option<CatRecord> {
        self.records.read().await.last().cloned()
    }

    /// Number of records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if the history is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    // ========================================================================
    // Observable
    // ========================================================================

    /// Subscribes to history changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    fn notify_change(&self) {
        self.notify.send_modify(|version| *version += 1);
    }

    // ========================================================================
    // Persisted History
    // ========================================================================

    /// Reads back every record persisted at `path`.
    ///
    /// A missing file is an empty history. Lines that fail to parse are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] for any other read failure.
    pub async fn load_persisted(
        persistence: &dyn Persistence,
        path: &Path,
    ) -> Result<Vec<CatRecord>, StoreError> {
        let content = match persistence.read_all(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No history file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let records = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(number, line)| match CatRecord::from_line(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(line = number + 1, error = %e, "Skipping unreadable history line");
                    None
                }
            })
            .collect();

        Ok(records)
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records writes in memory; optionally fails every write.
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

        fn writes(&self) -> Vec<(PathBuf, String)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Persistence for MemoryPersistence {
        async fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
            if self.fail {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "disk is read-only",
                ));
            }
            self.writes
                .lock()
                .unwrap()
                .push((path.to_path_buf(), content.to_string()));
            Ok(())
        }

        async fn read_all(&self, _path: &Path) -> std::io::Result<String> {
            Ok(self
                .writes
                .lock()
                .unwrap()
                .iter()
                .map(|(_, line)| format!("{line}\n"))
                .collect())
        }
    }

    fn record(n: u32) -> CatRecord {
        CatRecord::new(
            format!("https://cdn.example/{n}.jpg"),
            format!("fact {n}"),
            &SessionLabel::from_raw("User_testtest"),
        )
    }

    #[tokio::test]
    async fn test_append_writes_once_to_fixed_path() {
        let persistence = Arc::new(MemoryPersistence::default());
        let store = RecordStore::new(persistence.clone(), "/data/history.jsonl");

        store.append(record(1)).await.unwrap();

        let writes = persistence.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, PathBuf::from("/data/history.jsonl"));
        assert!(writes[0].1.contains("https://cdn.example/1.jpg"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_append_keeps_order() {
        let persistence = Arc::new(MemoryPersistence::default());
        let store = RecordStore::new(persistence, "h.jsonl");

        store.append(record(1)).await.unwrap();
        store.append(record(2)).await.unwrap();

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].fact(), "fact 1");
        assert_eq!(all[1].fact(), "fact 2");
        assert_eq!(store.latest().await.unwrap().fact(), "fact 2");
        assert_eq!(store.get(0).await.unwrap().fact(), "fact 1");
    }

    #[tokio::test]
    async fn test_failed_write_keeps_record() {
        let store = RecordStore::new(Arc::new(MemoryPersistence::failing()), "h.jsonl");

        let err = store.append(record(7)).await.unwrap_err();

        assert!(err.is_persistence());
        assert!(err.to_string().contains("disk is read-only"));
        assert_eq!(store.len().await, 1);
        assert_eq!(store.latest().await.unwrap().fact(), "fact 7");
    }

    #[tokio::test]
    async fn test_subscribers_notified_before_append_returns() {
        let store = RecordStore::new(Arc::new(MemoryPersistence::default()), "h.jsonl");
        let rx = store.subscribe();
        let before = *rx.borrow();

        store.append(record(1)).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow(), before + 1);
    }

    #[tokio::test]
    async fn test_notified_even_when_write_fails() {
        let store = RecordStore::new(Arc::new(MemoryPersistence::failing()), "h.jsonl");
        let rx = store.subscribe();

        let _ = store.append(record(1)).await;

        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_seed_examples_never_writes() {
        let persistence = Arc::new(MemoryPersistence::default());
        let store = RecordStore::new(persistence.clone(), "h.jsonl");
        let owner = SessionLabel::from_raw("User_seeded01");

        let added = store.seed_examples(&owner).await;

        assert_eq!(added, EXAMPLE_COUNT);
        assert_eq!(store.len().await, 3);
        assert!(persistence.writes().is_empty());

        let all = store.all().await;
        assert!(all.iter().all(|r| r.owner_label() == "User_seeded01"));
        assert!(all.iter().all(CatRecord::has_image));
        assert!(all[0].captured_at_time() < all[2].captured_at_time());
    }

    #[tokio::test]
    async fn test_load_persisted_roundtrip() {
        let persistence = Arc::new(MemoryPersistence::default());
        let store = RecordStore::new(persistence.clone(), "h.jsonl");
        store.append(record(1)).await.unwrap();
        store.append(record(2)).await.unwrap();

        let loaded = RecordStore::load_persisted(&*persistence, Path::new("h.jsonl"))
            .await
            .unwrap();

        assert_eq!(loaded, store.all().await);
    }

    /// Delays the first write so a later append can overtake it.
    struct SlowFirstWrite {
        inner: MemoryPersistence,
        delayed: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl Persistence for SlowFirstWrite {
        async fn write(&self, path: &Path, content: &str) -> std::io::Result<()> {
            if !self.delayed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            self.inner.write(path, content).await
        }

        async fn read_all(&self, path: &Path) -> std::io::Result<String> {
            self.inner.read_all(path).await
        }
    }

    #[tokio::test]
    async fn test_overlapping_appends_persist_in_history_order() {
        let persistence = Arc::new(SlowFirstWrite {
            inner: MemoryPersistence::default(),
            delayed: std::sync::atomic::AtomicBool::new(false),
        });
        let store = Arc::new(RecordStore::new(persistence.clone(), "h.jsonl"));
        let mut changes = store.subscribe();

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.append(record(1)).await })
        };
        changes.wait_for(|version| *version >= 1).await.unwrap();
        store.append(record(2)).await.unwrap();
        first.await.unwrap().unwrap();

        let in_memory: Vec<String> = store.all().await.iter().map(|r| r.fact().to_string()).collect();
        let on_disk: Vec<String> = RecordStore::load_persisted(&*persistence, Path::new("h.jsonl"))
            .await
            .unwrap()
            .iter()
            .map(|r| r.fact().to_string())
            .collect();

        assert_eq!(in_memory, vec!["fact 1", "fact 2"]);
        assert_eq!(on_disk, in_memory);
    }
}
