//! The two bounded worker pools.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Failure to obtain a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Cancellation fired before a slot became free.
    #[error("cancelled while waiting for a worker slot")]
    Cancelled,
    /// The semaphore was closed.
    #[error("worker pool closed")]
    Closed,
}

/// Global (URL job) and download (file transfer) capacity.
///
/// A slot is held by an [`OwnedSemaphorePermit`] and released when the
/// permit is dropped, on every exit path of the task that holds it.
#[derive(Debug, Clone)]
pub struct WorkerPools {
    global: Arc<Semaphore>,
    download: Arc<Semaphore>,
    global_capacity: usize,
    download_capacity: usize,
}

impl WorkerPools {
    /// Creates both pools with fixed capacities.
    #[must_use]
    pub fn new(global_capacity: usize, download_capacity: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global_capacity)),
            download: Arc::new(Semaphore::new(download_capacity)),
            global_capacity,
            download_capacity,
        }
    }

    /// Capacity of the URL job pool.
    #[must_use]
    pub fn global_capacity(&self) -> usize {
        self.global_capacity
    }

    /// Capacity of the file transfer pool.
    #[must_use]
    pub fn download_capacity(&self) -> usize {
        self.download_capacity
    }

    /// Free slots in the URL job pool.
    #[must_use]
    pub fn global_available(&self) -> usize {
        self.global.available_permits()
    }

    /// Free slots in the file transfer pool.
    #[must_use]
    pub fn download_available(&self) -> usize {
        self.download.available_permits()
    }

    /// Waits for a URL job slot or cancellation, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Cancelled`] when `cancel` fires first.
    pub async fn acquire_global(
        &self,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, PoolError> {
        acquire(&self.global, cancel).await
    }

    /// Waits for a file transfer slot or cancellation, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Cancelled`] when `cancel` fires first.
    pub async fn acquire_download(
        &self,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, PoolError> {
        acquire(&self.download, cancel).await
    }
}

async fn acquire(
    semaphore: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Result<OwnedSemaphorePermit, PoolError> {
    if cancel.is_cancelled() {
        return Err(PoolError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(PoolError::Cancelled),
        permit = Arc::clone(semaphore).acquire_owned() => permit.map_err(|_| PoolError::Closed),
    }
}
