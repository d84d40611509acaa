//! Periodic scan-and-ingest scheduler.
//!
//! Each run lists the watched folder, fingerprints every candidate file,
//! and hands files whose fingerprint is not yet in the ledger to the
//! ingestion port. A file is recorded only after the port reported success.
//! At most one run is in flight; a tick that arrives while a run is active
//! is dropped, not queued.

use crate::error::{IngestError, IngestResult};
use crate::fingerprint::{Fingerprinter, Sha256Fingerprinter};
use crate::port::IngestionPort;
use crate::scanner::Scanner;
use docloader_config::LoaderConfig;
use docloader_core::RunReport;
use docloader_db::Ledger;
use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Timing and concurrency settings for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub period: Duration,
    pub startup_delay: Duration,
    /// Upper bound for one ingestion port call. `None` waits indefinitely.
    pub file_timeout: Option<Duration>,
    /// Files processed concurrently within a run. 1 means sequential.
    pub max_concurrent_files: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
            startup_delay: Duration::from_secs(2),
            file_timeout: Some(Duration::from_secs(600)),
            max_concurrent_files: 1,
        }
    }
}

/// Shortest accepted tick period; the timer cannot tick on a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

impl SchedulerOptions {
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            period: config.period(),
            startup_delay: config.delay(),
            file_timeout: config.file_timeout(),
            max_concurrent_files: config.max_concurrent_files,
        }
        .normalized()
    }

    /// Clamp the period and the concurrency to values the scheduler can run with.
    fn normalized(self) -> Self {
        Self {
            period: self.period.max(MIN_PERIOD),
            max_concurrent_files: self.max_concurrent_files.max(1),
            ..self
        }
    }
}

/// How a call to [`Scheduler::run_once`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The file list was processed to the end.
    Completed(RunReport),
    /// The folder could not be listed; nothing was processed.
    Aborted(String),
    /// Another run was still active.
    Skipped,
}

impl RunOutcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Counters kept across runs.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_aborted: AtomicU64,
    ticks_skipped: AtomicU64,
}

/// Point-in-time copy of [`SchedulerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_aborted: u64,
    pub ticks_skipped: u64,
}

impl SchedulerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_aborted: self.runs_aborted.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Per-file result, folded into the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    AlreadyProcessed,
    Ingested,
    Duplicate,
    FingerprintFailed,
    IngestFailed,
    RecordFailed,
}

/// Clears the running flag on every exit path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives scanner, fingerprinter, ledger and ingestion port.
pub struct Scheduler {
    directory: PathBuf,
    options: SchedulerOptions,
    scanner: Scanner,
    fingerprinter: Arc<dyn Fingerprinter>,
    ledger: Arc<dyn Ledger>,
    port: Arc<dyn IngestionPort>,
    running: AtomicBool,
    stats: SchedulerStats,
}

impl Scheduler {
    /// Create a scheduler for `directory` with a SHA-256 fingerprinter and a
    /// scanner that accepts every regular file.
    pub fn new(
        directory: impl Into<PathBuf>,
        options: SchedulerOptions,
        ledger: Arc<dyn Ledger>,
        port: Arc<dyn IngestionPort>,
    ) -> Self {
        Self {
            directory: directory.into(),
            options: options.normalized(),
            scanner: Scanner::new(),
            fingerprinter: Arc::new(Sha256Fingerprinter),
            ledger,
            port,
            running: AtomicBool::new(false),
            stats: SchedulerStats::default(),
        }
    }

    pub fn with_scanner(mut self, scanner: Scanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    /// A tick must be dropped while the last spawned run has not finished,
    /// even if that run has not yet taken the running flag.
    fn tick_busy(&self, in_flight: Option<&JoinHandle<RunOutcome>>) -> bool {
        self.is_running() || in_flight.is_some_and(|handle| !handle.is_finished())
    }

    /// Tick on the configured period until `shutdown` flips to `true`.
    ///
    /// The first tick fires after the startup delay. Runs execute on their
    /// own task so the timer never waits on them. On shutdown the in-flight
    /// run, if any, is allowed to finish its file list.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let start = Instant::now() + self.options.startup_delay;
        let mut ticker = interval_at(start, self.options.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Scheduling scans of {} every {:?} (first in {:?})",
            self.directory.display(),
            self.options.period,
            self.options.startup_delay
        );

        let mut in_flight: Option<JoinHandle<RunOutcome>> = None;

        if !*shutdown.borrow() {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.tick_busy(in_flight.as_ref()) {
                            self.stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
                            debug!("Previous run still active, skipping tick");
                            continue;
                        }
                        let this = Arc::clone(&self);
                        in_flight = Some(tokio::spawn(async move { this.run_once().await }));
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!("Waiting for the active run to finish");
            }
            if let Err(e) = handle.await {
                error!("Run task failed: {}", e);
            }
        }

        info!("Scheduler stopped");
    }

    /// Perform one run now, unless another run is active.
    pub async fn run_once(&self) -> RunOutcome {
        let Some(_guard) = self.try_begin() else {
            self.stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Previous run still active, skipping");
            return RunOutcome::Skipped;
        };

        let run = self.stats.runs_started.fetch_add(1, Ordering::Relaxed) + 1;
        self.execute().instrument(info_span!("run", run)).await
    }

    async fn execute(&self) -> RunOutcome {
        let mut report = RunReport::started();
        info!("Scanning {}", self.directory.display());

        let files = match self.list_files().await {
            Ok(files) => files,
            Err(e) => {
                self.stats.runs_aborted.fetch_add(1, Ordering::Relaxed);
                error!("Run aborted: {}", e);
                return RunOutcome::Aborted(e.to_string());
            }
        };
        report.scanned = files.len();

        let outcomes: Vec<FileOutcome> = stream::iter(files)
            .map(|path| self.process_file(path))
            .buffer_unordered(self.options.max_concurrent_files)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                FileOutcome::AlreadyProcessed => report.already_processed += 1,
                FileOutcome::Ingested => report.ingested += 1,
                FileOutcome::Duplicate => report.duplicates += 1,
                FileOutcome::FingerprintFailed => report.fingerprint_failed += 1,
                FileOutcome::IngestFailed => report.ingest_failed += 1,
                FileOutcome::RecordFailed => report.record_failed += 1,
            }
        }

        let report = report.finish();
        self.stats.runs_completed.fetch_add(1, Ordering::Relaxed);
        if report.is_clean() {
            info!("Run finished: {}", report);
        } else {
            warn!("Run finished with failures: {}", report);
        }
        RunOutcome::Completed(report)
    }

    async fn list_files(&self) -> IngestResult<Vec<PathBuf>> {
        let scanner = self.scanner.clone();
        let directory = self.directory.clone();
        blocking(move || scanner.scan(&directory)?.collect()).await
    }

    async fn process_file(&self, path: PathBuf) -> FileOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let checksum = {
            let fingerprinter = Arc::clone(&self.fingerprinter);
            let path = path.clone();
            match blocking(move || fingerprinter.fingerprint(&path)).await {
                Ok(checksum) => checksum,
                Err(e) => {
                    warn!("Skipping {} (fingerprint): {}", file_name, e);
                    return FileOutcome::FingerprintFailed;
                }
            }
        };

        let known = {
            let ledger = Arc::clone(&self.ledger);
            let checksum = checksum.clone();
            blocking(move || Ok(ledger.lookup(&checksum)?)).await
        };
        match known {
            Ok(true) => {
                debug!("Already processed: {} ({})", file_name, checksum);
                return FileOutcome::AlreadyProcessed;
            }
            Ok(false) => {}
            Err(e) => {
                error!("Skipping {} (ledger lookup): {}", file_name, e);
                return FileOutcome::RecordFailed;
            }
        }

        info!("Ingesting {} via {}", file_name, self.port.name());
        if let Err(e) = self.ingest(&path).await {
            warn!("Skipping {} (ingest): {}", file_name, e);
            return FileOutcome::IngestFailed;
        }

        let recorded = {
            let ledger = Arc::clone(&self.ledger);
            let file_name = file_name.clone();
            let checksum = checksum.clone();
            blocking(move || Ok(ledger.record(&file_name, &checksum)?)).await
        };
        match recorded {
            Ok(record) => {
                info!("Document file has been processed: {} (id {})", path.display(), record.id);
                FileOutcome::Ingested
            }
            Err(IngestError::Database(e)) if e.is_duplicate() => {
                debug!("{} was recorded concurrently under the same checksum", file_name);
                FileOutcome::Duplicate
            }
            Err(e) => {
                error!(
                    "Ingested {} but could not record it, it will be ingested again: {}",
                    file_name, e
                );
                FileOutcome::RecordFailed
            }
        }
    }

    async fn ingest(&self, path: &Path) -> IngestResult<()> {
        match self.options.file_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.port.ingest(path)).await {
                Ok(result) => result,
                Err(_) => Err(IngestError::Timeout {
                    path: path.to_path_buf(),
                    seconds: limit.as_secs(),
                }),
            },
            None => self.port.ingest(path).await,
        }
    }
}

async fn blocking<T, F>(f: F) -> IngestResult<T>
where
    F: FnOnce() -> IngestResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docloader_core::ProcessedFile;
    use docloader_db::{Database, DbError, DbResult};
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::{Notify, Semaphore};

    /// Port double that records calls and can fail, hang or block on a gate.
    #[derive(Default)]
    struct RecordingPort {
        calls: Mutex<Vec<String>>,
        fail_names: Vec<String>,
        hang: bool,
        gate: Option<Arc<Semaphore>>,
        entered: Arc<Notify>,
    }

    impl RecordingPort {
        fn failing(names: &[&str]) -> Self {
            Self {
                fail_names: names.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IngestionPort for RecordingPort {
        async fn ingest(&self, path: &Path) -> IngestResult<()> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.calls.lock().unwrap().push(name.clone());
            self.entered.notify_one();

            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.hang {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail_names.contains(&name) {
                return Err(IngestError::ingestion(path, "backend rejected file"));
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    /// Fingerprinter that cannot read files whose name is listed.
    struct UnreadableFiles(Vec<String>);

    impl Fingerprinter for UnreadableFiles {
        fn fingerprint(&self, path: &Path) -> IngestResult<String> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if self.0.contains(&name) {
                return Err(IngestError::Fingerprint {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Sha256Fingerprinter.fingerprint(path)
        }
    }

    /// Ledger whose writes fail until `healthy` is set.
    struct FlakyLedger {
        db: Database,
        healthy: AtomicBool,
    }

    impl Ledger for FlakyLedger {
        fn lookup(&self, checksum: &str) -> DbResult<bool> {
            self.db.lookup(checksum)
        }

        fn record(&self, file_name: &str, checksum: &str) -> DbResult<ProcessedFile> {
            if !self.healthy.load(Ordering::SeqCst) {
                return Err(DbError::Other("disk full".to_string()));
            }
            self.db.record(file_name, checksum)
        }
    }

    /// Ledger whose lookups never see existing records, as if another
    /// writer raced ahead between lookup and record.
    struct StaleLookupLedger(Database);

    impl Ledger for StaleLookupLedger {
        fn lookup(&self, _checksum: &str) -> DbResult<bool> {
            Ok(false)
        }

        fn record(&self, file_name: &str, checksum: &str) -> DbResult<ProcessedFile> {
            self.0.record(file_name, checksum)
        }
    }

    fn options() -> SchedulerOptions {
        SchedulerOptions {
            period: Duration::from_millis(50),
            startup_delay: Duration::ZERO,
            file_timeout: Some(Duration::from_secs(5)),
            max_concurrent_files: 1,
        }
    }

    fn setup(port: Arc<RecordingPort>) -> (TempDir, Database, Scheduler) {
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let scheduler = Scheduler::new(dir.path(), options(), Arc::new(db.clone()), port);
        (dir, db, scheduler)
    }

    fn completed(outcome: RunOutcome) -> RunReport {
        match outcome {
            RunOutcome::Completed(report) => report,
            other => panic!("expected completed run, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_report_scenario() {
        let port = Arc::new(RecordingPort::default());
        let (dir, db, scheduler) = setup(Arc::clone(&port));
        std::fs::write(dir.path().join("report.pdf"), b"%PDF-1.7 quarterly report").unwrap();

        // First tick: ingested once and recorded
        let report = completed(scheduler.run_once().await);
        assert_eq!(report.ingested, 1);
        assert_eq!(port.calls(), vec!["report.pdf"]);
        let records = db.list_processed(None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "report.pdf");
        let checksum = records[0].checksum.clone();

        // Second tick, nothing new
        let report = completed(scheduler.run_once().await);
        assert_eq!(report.already_processed, 1);
        assert_eq!(port.calls().len(), 1);

        // Third tick, identical copy under another name
        std::fs::copy(dir.path().join("report.pdf"), dir.path().join("report-copy.pdf")).unwrap();
        let report = completed(scheduler.run_once().await);
        assert_eq!(report.scanned, 2);
        assert_eq!(report.already_processed, 2);
        assert_eq!(report.ingested, 0);
        assert_eq!(port.calls().len(), 1);

        let records = db.list_processed(None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].checksum, checksum);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rename_does_not_reingest() {
        let port = Arc::new(RecordingPort::default());
        let (dir, db, scheduler) = setup(Arc::clone(&port));
        std::fs::write(dir.path().join("draft.txt"), b"content").unwrap();

        completed(scheduler.run_once().await);
        std::fs::rename(dir.path().join("draft.txt"), dir.path().join("final.txt")).unwrap();
        let report = completed(scheduler.run_once().await);

        assert_eq!(report.already_processed, 1);
        assert_eq!(port.calls(), vec!["draft.txt"]);
        assert_eq!(db.count_processed().unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_changed_byte_is_new_file() {
        let port = Arc::new(RecordingPort::default());
        let (dir, db, scheduler) = setup(Arc::clone(&port));
        let path = dir.path().join("notes.txt");

        std::fs::write(&path, b"version 1").unwrap();
        completed(scheduler.run_once().await);

        std::fs::write(&path, b"version 2").unwrap();
        let report = completed(scheduler.run_once().await);

        assert_eq!(report.ingested, 1);
        assert_eq!(port.calls(), vec!["notes.txt", "notes.txt"]);
        assert_eq!(db.count_processed().unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_partial_failures_are_isolated() {
        let port = Arc::new(RecordingPort::failing(&["c.txt"]));
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let scheduler = Scheduler::new(dir.path(), options(), Arc::new(db.clone()), port.clone())
            .with_fingerprinter(Arc::new(UnreadableFiles(vec!["b.txt".to_string()])));

        std::fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bravo").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"charlie").unwrap();

        let report = completed(scheduler.run_once().await);

        assert_eq!(report.scanned, 3);
        assert_eq!(report.ingested, 1);
        assert_eq!(report.fingerprint_failed, 1);
        assert_eq!(report.ingest_failed, 1);

        let records = db.list_processed(None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "a.txt");

        // The failed file is retried on the next run
        let report = completed(scheduler.run_once().await);
        assert_eq!(report.already_processed, 1);
        assert_eq!(report.ingest_failed, 1);
        assert_eq!(port.calls(), vec!["a.txt", "c.txt", "c.txt"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_record_failure_leaves_file_eligible() {
        let port = Arc::new(RecordingPort::default());
        let dir = tempdir().unwrap();
        let ledger = Arc::new(FlakyLedger {
            db: Database::open_in_memory().unwrap(),
            healthy: AtomicBool::new(false),
        });
        let scheduler = Scheduler::new(dir.path(), options(), ledger.clone(), port.clone());
        std::fs::write(dir.path().join("report.pdf"), b"pdf").unwrap();

        let report = completed(scheduler.run_once().await);
        assert_eq!(report.record_failed, 1);
        assert_eq!(ledger.db.count_processed().unwrap(), 0);

        ledger.healthy.store(true, Ordering::SeqCst);
        let report = completed(scheduler.run_once().await);
        assert_eq!(report.ingested, 1);
        assert_eq!(port.calls().len(), 2);
        assert_eq!(ledger.db.count_processed().unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_duplicate_checksum_is_benign() {
        let port = Arc::new(RecordingPort::default());
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let scheduler = Scheduler::new(
            dir.path(),
            options(),
            Arc::new(StaleLookupLedger(db.clone())),
            port.clone(),
        );
        std::fs::write(dir.path().join("one.pdf"), b"identical").unwrap();
        std::fs::write(dir.path().join("two.pdf"), b"identical").unwrap();

        let report = completed(scheduler.run_once().await);

        assert_eq!(report.ingested, 1);
        assert_eq!(report.duplicates, 1);
        assert!(report.is_clean());
        assert_eq!(port.calls().len(), 2);
        assert_eq!(db.count_processed().unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_directory_aborts_run_only() {
        let port = Arc::new(RecordingPort::default());
        let root = tempdir().unwrap();
        let watched = root.path().join("inbox");
        let db = Database::open_in_memory().unwrap();
        let scheduler = Scheduler::new(&watched, options(), Arc::new(db.clone()), port.clone());

        assert!(matches!(scheduler.run_once().await, RunOutcome::Aborted(_)));
        assert!(!scheduler.is_running());

        std::fs::create_dir(&watched).unwrap();
        std::fs::write(watched.join("late.txt"), b"late").unwrap();
        let report = completed(scheduler.run_once().await);
        assert_eq!(report.ingested, 1);

        let stats = scheduler.stats();
        assert_eq!(stats.runs_started, 2);
        assert_eq!(stats.runs_aborted, 1);
        assert_eq!(stats.runs_completed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_hanging_ingestion_times_out() {
        let port = Arc::new(RecordingPort {
            hang: true,
            ..Default::default()
        });
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let opts = SchedulerOptions {
            file_timeout: Some(Duration::from_millis(50)),
            ..options()
        };
        let scheduler = Scheduler::new(dir.path(), opts, Arc::new(db.clone()), port.clone());
        std::fs::write(dir.path().join("stuck.pdf"), b"stuck").unwrap();

        let report = completed(scheduler.run_once().await);

        assert_eq!(report.ingest_failed, 1);
        assert_eq!(db.count_processed().unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_files() {
        let port = Arc::new(RecordingPort::default());
        let dir = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let opts = SchedulerOptions {
            max_concurrent_files: 4,
            ..options()
        };
        let scheduler = Scheduler::new(dir.path(), opts, Arc::new(db.clone()), port.clone());
        for i in 0..10 {
            std::fs::write(dir.path().join(format!("doc-{i}.txt")), format!("body {i}")).unwrap();
        }

        let report = completed(scheduler.run_once().await);

        assert_eq!(report.ingested, 10);
        assert_eq!(db.count_processed().unwrap(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_identical_files_in_parallel() {
        let port = Arc::new(RecordingPort::default());
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("ledger").join("docloader.db")).unwrap();
        let inbox = dir.path().join("inbox");
        std::fs::create_dir(&inbox).unwrap();
        let opts = SchedulerOptions {
            max_concurrent_files: 6,
            ..options()
        };
        let scheduler = Scheduler::new(&inbox, opts, Arc::new(db.clone()), port.clone());
        for i in 0..6 {
            std::fs::write(inbox.join(format!("copy-{i}.pdf")), b"same scanned invoice").unwrap();
        }

        let report = completed(scheduler.run_once().await);

        assert_eq!(report.scanned, 6);
        assert_eq!(report.ingested, 1);
        assert_eq!(report.ingested + report.duplicates + report.already_processed, 6);
        assert!(report.is_clean());
        assert_eq!(db.count_processed().unwrap(), 1);

        let report = completed(scheduler.run_once().await);
        assert_eq!(report.already_processed, 6);
        assert_eq!(db.count_processed().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_period_is_clamped() {
        let port = Arc::new(RecordingPort::default());
        let dir = tempdir().unwrap();
        let opts = SchedulerOptions {
            period: Duration::ZERO,
            max_concurrent_files: 0,
            ..options()
        };
        let db = Database::open_in_memory().unwrap();
        let scheduler = Arc::new(Scheduler::new(dir.path(), opts, Arc::new(db), port));

        assert!(scheduler.options().period > Duration::ZERO);
        assert_eq!(scheduler.options().max_concurrent_files, 1);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timer = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();
        timer.await.unwrap();

        assert!(scheduler.stats().runs_started >= 1);
    }

    #[tokio::test]
    async fn test_tick_busy_until_spawned_run_finishes() {
        let port = Arc::new(RecordingPort::default());
        let (_dir, _db, scheduler) = setup(port);

        // A spawned run that has not taken the running flag yet
        let gate = Arc::new(Notify::new());
        let pending = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                gate.notified().await;
                RunOutcome::Skipped
            })
        };

        assert!(!scheduler.is_running());
        assert!(!scheduler.tick_busy(None));
        assert!(scheduler.tick_busy(Some(&pending)));

        gate.notify_one();
        while !pending.is_finished() {
            tokio::task::yield_now().await;
        }
        assert!(!scheduler.tick_busy(Some(&pending)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_once_skips_while_active() {
        let gate = Arc::new(Semaphore::new(0));
        let port = Arc::new(RecordingPort::gated(gate.clone()));
        let (dir, db, scheduler) = setup(Arc::clone(&port));
        std::fs::write(dir.path().join("slow.pdf"), b"slow").unwrap();
        let scheduler = Arc::new(scheduler);

        let first = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run_once().await })
        };
        port.entered.notified().await;

        assert!(scheduler.is_running());
        assert_eq!(scheduler.run_once().await, RunOutcome::Skipped);

        gate.add_permits(1);
        let report = completed(first.await.unwrap());
        assert_eq!(report.ingested, 1);
        assert!(!scheduler.is_running());
        assert_eq!(db.count_processed().unwrap(), 1);
        assert_eq!(scheduler.stats().runs_started, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_ticks_do_not_overlap() {
        let gate = Arc::new(Semaphore::new(0));
        let port = Arc::new(RecordingPort::gated(gate.clone()));
        let (dir, db, scheduler) = setup(Arc::clone(&port));
        std::fs::write(dir.path().join("slow.pdf"), b"slow").unwrap();
        let scheduler = Arc::new(scheduler);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timer = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

        // Block the first run across several tick boundaries
        port.entered.notified().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        let stats = scheduler.stats();
        assert_eq!(stats.runs_started, 1);
        assert!(stats.ticks_skipped >= 1);
        assert_eq!(port.calls().len(), 1);

        gate.add_permits(1);
        shutdown_tx.send(true).unwrap();
        timer.await.unwrap();

        assert_eq!(db.count_processed().unwrap(), 1);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_waits_for_active_run() {
        let gate = Arc::new(Semaphore::new(0));
        let port = Arc::new(RecordingPort::gated(gate.clone()));
        let (dir, db, scheduler) = setup(Arc::clone(&port));
        std::fs::write(dir.path().join("slow.pdf"), b"slow").unwrap();
        let scheduler = Arc::new(scheduler);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timer = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

        port.entered.notified().await;
        shutdown_tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!timer.is_finished());

        gate.add_permits(1);
        timer.await.unwrap();
        assert_eq!(db.count_processed().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_startup_delay() {
        let port = Arc::new(RecordingPort::default());
        let (dir, _db, scheduler) = setup(Arc::clone(&port));
        let scheduler = Arc::new(Scheduler {
            options: SchedulerOptions {
                startup_delay: Duration::from_secs(60),
                ..options()
            },
            ..scheduler
        });
        std::fs::write(dir.path().join("early.txt"), b"early").unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timer = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(scheduler.stats().runs_started, 0);

        shutdown_tx.send(true).unwrap();
        timer.await.unwrap();
        assert!(port.calls().is_empty());
    }
}
