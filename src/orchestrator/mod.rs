//! Batch orchestration: URL jobs, file jobs, deduplication and cancellation.
//!
//! # Concurrency Model
//!
//! - Each submitted URL runs in its own task holding one global-pool slot
//!   while it resolves and dispatches its files
//! - Each resolved file runs in its own task holding one download-pool slot
//!   for the duration of the transfer
//! - A file id is claimed in [`ActiveFiles`] before its task is spawned, so
//!   at most one transfer per id is ever in flight
//! - Every task is tracked; [`Orchestrator::wait`] returns once all of them
//!   have finished
//! - One cancellation token, held by [`BatchControl`], is shared by all
//!   tasks; once fired, waiting jobs give up and no new slot is handed out

mod control;
mod pool;
mod registry;
mod stats;

pub use control::BatchControl;
pub use pool::{PoolError, WorkerPools};
pub use registry::{ActiveFileGuard, ActiveFiles};
pub use stats::JobStats;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{Catalog, FileDescriptor};
use crate::download::Transfer;

/// What happened to a file submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSubmission {
    /// The file was claimed and a transfer task was spawned.
    Accepted,
    /// A transfer for the same file id is already in flight.
    Duplicate,
}

struct Inner {
    pools: WorkerPools,
    active: ActiveFiles,
    tracker: TaskTracker,
    control: BatchControl,
    catalog: Arc<dyn Catalog>,
    transfer: Arc<dyn Transfer>,
    output_dir: PathBuf,
    stats: JobStats,
}

/// Owns all orchestration state for one process.
///
/// Cloning is cheap and yields a handle to the same state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("pools", &self.inner.pools)
            .field("active", &self.inner.active.len())
            .field("output_dir", &self.inner.output_dir)
            .field("cancelled", &self.inner.control.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator writing into `output_dir`.
    #[must_use]
    pub fn new(
        pools: WorkerPools,
        catalog: Arc<dyn Catalog>,
        transfer: Arc<dyn Transfer>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_control(pools, catalog, transfer, output_dir, BatchControl::new())
    }

    /// Creates an orchestrator that adopts an existing [`BatchControl`],
    /// typically the one a signal listener was installed with.
    #[must_use]
    pub fn with_control(
        pools: WorkerPools,
        catalog: Arc<dyn Catalog>,
        transfer: Arc<dyn Transfer>,
        output_dir: impl Into<PathBuf>,
        control: BatchControl,
    ) -> Self {
        let output_dir = output_dir.into();
        debug!(
            global = pools.global_capacity(),
            download = pools.download_capacity(),
            output_dir = %output_dir.display(),
            "creating orchestrator"
        );
        Self {
            inner: Arc::new(Inner {
                pools,
                active: ActiveFiles::new(),
                tracker: TaskTracker::new(),
                control,
                catalog,
                transfer,
                output_dir,
                stats: JobStats::new(),
            }),
        }
    }

    /// Cancellation and batch state shared with the signal listener.
    #[must_use]
    pub fn control(&self) -> &BatchControl {
        &self.inner.control
    }

    /// Fires the shared cancellation token.
    pub fn cancel(&self) {
        self.inner.control.cancel();
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.control.is_cancelled()
    }

    /// Whether a batch is currently being processed.
    #[must_use]
    pub fn has_active_batch(&self) -> bool {
        self.inner.control.has_active_batch()
    }

    /// Counters for this orchestrator's jobs.
    #[must_use]
    pub fn stats(&self) -> &JobStats {
        &self.inner.stats
    }

    /// Registry of files with a transfer in flight.
    #[must_use]
    pub fn active_files(&self) -> &ActiveFiles {
        &self.inner.active
    }

    /// Directory downloads are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.inner.output_dir
    }

    /// Spawns a URL job.
    ///
    /// The job waits for a global slot, resolves `url`, and submits every
    /// resolved file. Its slot is released once the files are dispatched,
    /// not when their transfers finish.
    pub fn submit_url(&self, url: impl Into<String>) {
        let url = url.into();
        let this = self.clone();
        self.inner.tracker.spawn(async move {
            this.run_url_job(url).await;
        });
    }

    /// Claims `file` and spawns its transfer, unless it is already in flight.
    pub fn submit_file(&self, file: FileDescriptor) -> FileSubmission {
        let file_id = file.file_id();
        let Some(claim) = self.inner.active.try_claim(&file_id) else {
            debug!(file_id = %file_id, "transfer already in flight; skipping duplicate");
            self.inner.stats.record_duplicate();
            return FileSubmission::Duplicate;
        };

        let this = self.clone();
        self.inner.tracker.spawn(async move {
            this.run_file_job(file, claim).await;
        });
        FileSubmission::Accepted
    }

    /// Submits every URL of a batch and waits for all resulting jobs.
    ///
    /// Individual failures are logged and counted, never returned.
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub async fn run_batch(&self, urls: Vec<String>) {
        if urls.is_empty() {
            debug!("empty batch; nothing to do");
            return;
        }

        self.inner.control.begin_batch(urls.len());
        info!(urls = urls.len(), "starting batch");
        for url in urls {
            self.submit_url(url);
        }

        self.wait().await;
        self.inner.control.end_batch();

        let stats = &self.inner.stats;
        info!(
            completed = stats.files_completed(),
            failed = stats.files_failed(),
            duplicates = stats.duplicates_skipped(),
            unresolved = stats.urls_failed(),
            cancelled = stats.cancelled(),
            "batch finished"
        );
    }

    /// Waits until every job spawned so far, and every job those spawn,
    /// has returned.
    pub async fn wait(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        self.inner.tracker.reopen();
    }

    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn run_url_job(&self, url: String) {
        let inner = &self.inner;
        let _permit = match inner.pools.acquire_global(inner.control.token()).await {
            Ok(permit) => permit,
            Err(error) => {
                debug!(error = %error, "URL job not started");
                inner.stats.record_cancelled();
                return;
            }
        };

        let files = match inner.catalog.resolve(&url).await {
            Ok(files) => files,
            Err(error) => {
                warn!(url = %url, error = %error, "failed to resolve URL");
                inner.stats.record_url_failed();
                return;
            }
        };
        inner.stats.record_url_resolved();
        debug!(files = files.len(), "URL resolved");

        for file in files {
            self.submit_file(file);
        }
    }

    #[instrument(level = "debug", skip(self, file, claim), fields(file_id = %claim.file_id()))]
    async fn run_file_job(&self, file: FileDescriptor, claim: ActiveFileGuard) {
        let inner = &self.inner;
        // The claim is released when this function returns, on every path.
        let _claim = claim;
        let _permit = match inner.pools.acquire_download(inner.control.token()).await {
            Ok(permit) => permit,
            Err(error) => {
                debug!(error = %error, "transfer not started");
                inner.stats.record_cancelled();
                return;
            }
        };

        match inner.transfer.transfer(&file, &inner.output_dir).await {
            Ok(path) => {
                info!(file_id = %file.file_id(), path = %path.display(), "download completed");
                inner.stats.record_file_completed();
            }
            Err(error) => {
                warn!(file_id = %file.file_id(), error = %error, "download failed");
                inner.stats.record_file_failed();
            }
        }
    }
}
