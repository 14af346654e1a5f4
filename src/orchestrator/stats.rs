//! Counters for one batch run.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome counters updated concurrently by URL and file jobs.
#[derive(Debug, Default)]
pub struct JobStats {
    urls_resolved: AtomicUsize,
    urls_failed: AtomicUsize,
    files_completed: AtomicUsize,
    files_failed: AtomicUsize,
    duplicates_skipped: AtomicUsize,
    cancelled: AtomicUsize,
}

impl JobStats {
    /// Creates a tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs resolved without error.
    #[must_use]
    pub fn urls_resolved(&self) -> usize {
        self.urls_resolved.load(Ordering::SeqCst)
    }

    /// URLs whose resolution failed.
    #[must_use]
    pub fn urls_failed(&self) -> usize {
        self.urls_failed.load(Ordering::SeqCst)
    }

    /// Files written to disk.
    #[must_use]
    pub fn files_completed(&self) -> usize {
        self.files_completed.load(Ordering::SeqCst)
    }

    /// Files whose transfer failed.
    #[must_use]
    pub fn files_failed(&self) -> usize {
        self.files_failed.load(Ordering::SeqCst)
    }

    /// File submissions dropped because the same file was in flight.
    #[must_use]
    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped.load(Ordering::SeqCst)
    }

    /// Jobs that gave up waiting for a slot because of cancellation.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether any URL or file job failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.urls_failed() + self.files_failed() > 0
    }

    pub(crate) fn record_url_resolved(&self) {
        self.urls_resolved.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_url_failed(&self) {
        self.urls_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_file_completed(&self) {
        self.files_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}
