//! File transfer: streaming a resolved track to disk.
//!
//! [`Transfer`] is the seam the orchestrator downloads through; the store
//! client implements it on top of [`HttpClient`]. Transfers are
//! single-attempt: a failure is reported to the caller and never retried.

mod client;
mod constants;
mod error;
mod filename;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_EXTENSION, READ_TIMEOUT_SECS};
pub use error::DownloadError;
pub(crate) use filename::output_file_name;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::catalog::FileDescriptor;

/// Downloads one resolved file into a directory.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Fetches `file` into `output_dir` and returns the final path.
    async fn transfer(
        &self,
        file: &FileDescriptor,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError>;
}

// Note: no module-local Result aliases. Use `Result<T, DownloadError>`.
