use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

/// Cancellation and batch-in-flight state shared by the orchestrator and
/// the signal listener.
///
/// It exists before any orchestrator does, so signal handling can be
/// installed at startup and adopted later via
/// [`Orchestrator::with_control`](super::Orchestrator::with_control).
#[derive(Debug, Clone, Default)]
pub struct BatchControl {
    cancel: CancellationToken,
    batch_size: Arc<AtomicUsize>,
}

impl BatchControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token observed by every job.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether a batch is currently being processed.
    #[must_use]
    pub fn has_active_batch(&self) -> bool {
        self.batch_size.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn begin_batch(&self, size: usize) {
        self.batch_size.store(size, Ordering::SeqCst);
    }

    pub(crate) fn end_batch(&self) {
        self.batch_size.store(0, Ordering::SeqCst);
    }
}
