//! Owned, injectable store for the CSV-backed drug dataset.
//!
//! The store reads the source file once and publishes the parsed rows as an
//! immutable snapshot. Readers clone the snapshot handle and never observe a
//! partially populated sequence: a load either swaps in the complete result or
//! leaves the previous contents in place.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::{AppConfig, DEFAULT_LOAD_TIMEOUT};
use crate::error::MedDbError;

mod record;

pub use record::DrugRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetStatus {
    /// No load has been attempted.
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug)]
struct DatasetState {
    records: Arc<Vec<DrugRecord>>,
    status: DatasetStatus,
    last_error: Option<String>,
}

/// Consistent read view over the store at one point in time.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    records: Arc<Vec<DrugRecord>>,
    status: DatasetStatus,
    last_error: Option<String>,
}

impl DatasetSnapshot {
    pub fn records(&self) -> &[DrugRecord] {
        &self.records
    }

    pub fn is_loaded(&self) -> bool {
        self.status == DatasetStatus::Loaded
    }

    pub fn status(&self) -> DatasetStatus {
        self.status
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[derive(Debug)]
pub struct DatasetStore {
    path: PathBuf,
    load_timeout: Duration,
    state: RwLock<DatasetState>,
    load_guard: Mutex<()>,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>, load_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            load_timeout,
            state: RwLock::new(DatasetState {
                records: Arc::new(Vec::new()),
                status: DatasetStatus::Idle,
                last_error: None,
            }),
            load_guard: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.dataset_path.clone(), config.load_timeout)
    }

    /// Builds an already-loaded store from in-memory rows.
    pub fn from_records(records: Vec<DrugRecord>) -> Self {
        let store = Self::new(PathBuf::from("<memory>"), DEFAULT_LOAD_TIMEOUT);
        store.commit(records);
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> DatasetSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        DatasetSnapshot {
            records: Arc::clone(&state.records),
            status: state.status,
            last_error: state.last_error.clone(),
        }
    }

    pub fn status(&self) -> DatasetStatus {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    /// Reads the dataset unless it is already loaded.
    ///
    /// # Errors
    ///
    /// Returns the load failure; the store then stays empty with status
    /// `failed`.
    pub async fn load(&self) -> Result<(), MedDbError> {
        let _guard = self.load_guard.lock().await;
        if self.status() == DatasetStatus::Loaded {
            return Ok(());
        }
        self.load_locked().await
    }

    /// Performs one load attempt. Callers hold `load_guard`.
    async fn load_locked(&self) -> Result<(), MedDbError> {
        self.set_status(DatasetStatus::Loading);
        let _pending = PendingLoad { store: self };
        let started = Instant::now();
        match self.read_records().await {
            Ok(records) => {
                info!(
                    path = %self.path.display(),
                    records = records.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Drug database loaded"
                );
                self.commit(records);
                Ok(())
            }
            Err(err) => {
                error!(path = %self.path.display(), error = %err, "Drug database load failed");
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Loads only when no attempt has been made yet, then returns a snapshot.
    ///
    /// Failures are logged by `load` and reflected in the snapshot status.
    /// Callers that arrive while another load is in flight wait for its outcome.
    pub async fn ensure_loaded(&self) -> DatasetSnapshot {
        if matches!(self.status(), DatasetStatus::Loaded | DatasetStatus::Failed) {
            return self.snapshot();
        }
        let _guard = self.load_guard.lock().await;
        if self.status() == DatasetStatus::Idle {
            let _ = self.load_locked().await;
        }
        self.snapshot()
    }

    /// Re-reads the source file regardless of current status.
    ///
    /// # Errors
    ///
    /// Returns the load failure. Previously loaded rows stay published.
    pub async fn reload(&self) -> Result<usize, MedDbError> {
        let _guard = self.load_guard.lock().await;
        match self.read_records().await {
            Ok(records) => {
                let count = records.len();
                info!(path = %self.path.display(), records = count, "Drug database reloaded");
                self.commit(records);
                Ok(count)
            }
            Err(err) => {
                if self.status() == DatasetStatus::Loaded {
                    warn!(error = %err, "Reload failed; keeping previously loaded records");
                    self.state
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .last_error = Some(err.to_string());
                } else {
                    error!(path = %self.path.display(), error = %err, "Drug database load failed");
                    self.fail(&err);
                }
                Err(err)
            }
        }
    }

    async fn read_records(&self) -> Result<Vec<DrugRecord>, MedDbError> {
        let path = self.path.clone();
        let task = tokio::task::spawn_blocking(move || read_dataset_file(&path));
        match tokio::time::timeout(self.load_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(MedDbError::LoadTask(join_err.to_string())),
            Err(_) => Err(MedDbError::LoadTimeout {
                path: self.path.clone(),
                timeout: self.load_timeout,
            }),
        }
    }

    fn set_status(&self, status: DatasetStatus) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = status;
    }

    fn commit(&self, records: Vec<DrugRecord>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.records = Arc::new(records);
        state.status = DatasetStatus::Loaded;
        state.last_error = None;
    }

    fn fail(&self, err: &MedDbError) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.records = Arc::new(Vec::new());
        state.status = DatasetStatus::Failed;
        state.last_error = Some(err.to_string());
    }
}

/// Returns the store to `Idle` if a load future is dropped before it commits
/// or fails, so the next caller retries instead of waiting on a dead load.
struct PendingLoad<'a> {
    store: &'a DatasetStore,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        let mut state = self
            .store
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if state.status == DatasetStatus::Loading {
            state.status = DatasetStatus::Idle;
        }
    }
}

fn read_dataset_file(path: &Path) -> Result<Vec<DrugRecord>, MedDbError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(MedDbError::DatasetMissing {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };
    record::parse_records(BufReader::new(file)).map_err(|source| MedDbError::DatasetParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FIXTURE: &str = "drug_name,indication,rx_otc,pregnancy_category\n\
                           Aspirin,pain,OTC,C\n\
                           Warfarin,clots,Rx,X\n\
                           Acetaminophen,fever,OTC,B\n";

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write fixture");
        file.flush().expect("flush fixture");
        file
    }

    fn names(snapshot: &DatasetSnapshot) -> Vec<String> {
        snapshot.records().iter().map(|r| r.name.clone()).collect()
    }

    #[tokio::test]
    async fn load_populates_records_in_file_order() {
        let file = write_fixture(FIXTURE);
        let store = DatasetStore::new(file.path(), Duration::from_secs(5));
        assert_eq!(store.status(), DatasetStatus::Idle);

        store.load().await.expect("load");

        let snapshot = store.snapshot();
        assert!(snapshot.is_loaded());
        assert_eq!(names(&snapshot), vec!["Aspirin", "Warfarin", "Acetaminophen"]);
    }

    #[tokio::test]
    async fn second_load_is_a_no_op_without_io() {
        let file = write_fixture(FIXTURE);
        let path = file.path().to_path_buf();
        let store = DatasetStore::new(&path, Duration::from_secs(5));
        store.load().await.expect("first load");
        let first = store.snapshot();

        // Removing the file proves the second call never touches disk.
        drop(file);
        assert!(!path.exists());
        store.load().await.expect("second load");

        let second = store.snapshot();
        assert!(Arc::ptr_eq(&first.records, &second.records));
        assert_eq!(names(&first), names(&second));
    }

    #[tokio::test]
    async fn missing_file_leaves_store_empty_and_failed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DatasetStore::new(dir.path().join("absent.csv"), Duration::from_secs(5));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, MedDbError::DatasetMissing { .. }));

        let snapshot = store.snapshot();
        assert!(!snapshot.is_loaded());
        assert_eq!(snapshot.status(), DatasetStatus::Failed);
        assert_eq!(snapshot.total(), 0);
        assert!(snapshot.last_error().is_some_and(|e| e.contains("absent.csv")));
    }

    #[tokio::test]
    async fn malformed_row_publishes_nothing() {
        let file = write_fixture("drug_name,rx_otc\nAspirin,OTC\nWarfarin\n");
        let store = DatasetStore::new(file.path(), Duration::from_secs(5));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, MedDbError::DatasetParse { .. }));
        assert_eq!(store.snapshot().total(), 0);
        assert!(!store.snapshot().is_loaded());
    }

    #[tokio::test]
    async fn ensure_loaded_does_not_retry_after_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("late.csv");
        let store = DatasetStore::new(&path, Duration::from_secs(5));

        let snapshot = store.ensure_loaded().await;
        assert_eq!(snapshot.status(), DatasetStatus::Failed);

        std::fs::write(&path, FIXTURE).expect("write late file");
        let snapshot = store.ensure_loaded().await;
        assert_eq!(snapshot.status(), DatasetStatus::Failed);

        assert_eq!(store.reload().await.expect("reload"), 3);
        assert!(store.snapshot().is_loaded());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_records() {
        let file = write_fixture(FIXTURE);
        let path = file.path().to_path_buf();
        let store = DatasetStore::new(&path, Duration::from_secs(5));
        store.load().await.expect("load");

        std::fs::write(&path, "drug_name,rx_otc\nbroken\n").expect("corrupt file");
        assert!(store.reload().await.is_err());

        let snapshot = store.snapshot();
        assert!(snapshot.is_loaded());
        assert_eq!(snapshot.total(), 3);
        assert!(snapshot.last_error().is_some());
    }

    #[tokio::test]
    async fn reload_picks_up_new_contents() {
        let file = write_fixture(FIXTURE);
        let path = file.path().to_path_buf();
        let store = DatasetStore::new(&path, Duration::from_secs(5));
        store.load().await.expect("load");

        std::fs::write(&path, "drug_name\nIbuprofen\n").expect("rewrite");
        assert_eq!(store.reload().await.expect("reload"), 1);
        assert_eq!(names(&store.snapshot()), vec!["Ibuprofen"]);
    }

    #[cfg(unix)]
    fn make_fifo(path: &Path) {
        let status = std::process::Command::new("mkfifo")
            .arg(path)
            .status()
            .expect("run mkfifo");
        assert!(status.success());
    }

    /// Opens the write end so a blocked reader sees EOF and its thread exits.
    #[cfg(unix)]
    fn release_fifo(path: &Path) {
        let writer = std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .expect("open fifo writer");
        drop(writer);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stalled_read_times_out_and_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stalled.csv");
        make_fifo(&path);
        let store = DatasetStore::new(&path, Duration::from_millis(300));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, MedDbError::LoadTimeout { .. }));
        assert!(err.to_string().contains("300ms"));
        assert_eq!(store.status(), DatasetStatus::Failed);
        assert_eq!(store.snapshot().total(), 0);

        release_fifo(&path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancelled_lazy_load_is_retried() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drugs.csv");
        make_fifo(&path);
        let store = DatasetStore::new(&path, Duration::from_secs(30));

        let cancelled =
            tokio::time::timeout(Duration::from_millis(100), store.ensure_loaded()).await;
        assert!(cancelled.is_err());
        assert_eq!(store.status(), DatasetStatus::Idle);

        release_fifo(&path);
        std::fs::remove_file(&path).expect("remove fifo");
        std::fs::write(&path, FIXTURE).expect("write dataset");

        let snapshot = store.ensure_loaded().await;
        assert_eq!(snapshot.status(), DatasetStatus::Loaded);
        assert_eq!(names(&snapshot), vec!["Aspirin", "Warfarin", "Acetaminophen"]);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let file = write_fixture(FIXTURE);
        let store = Arc::new(DatasetStore::new(file.path(), Duration::from_secs(5)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.ensure_loaded().await })
            })
            .collect();
        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.expect("join"));
        }

        let first = &snapshots[0];
        assert!(first.is_loaded());
        assert_eq!(first.total(), 3);
        for snapshot in &snapshots[1..] {
            assert!(snapshot.is_loaded());
            assert!(Arc::ptr_eq(&first.records, &snapshot.records));
        }
    }

    #[test]
    fn from_records_is_loaded() {
        let store = DatasetStore::from_records(vec![DrugRecord {
            name: "Aspirin".into(),
            ..Default::default()
        }]);
        let snapshot = store.snapshot();
        assert!(snapshot.is_loaded());
        assert_eq!(snapshot.total(), 1);
    }
}
