//! Constants for the download module (timeouts, file naming).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout: the longest gap allowed between two reads,
/// not a deadline for the whole body.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Extension used when the download location carries none.
pub const DEFAULT_EXTENSION: &str = "flac";

/// Suffix for files still being written.
pub const PARTIAL_SUFFIX: &str = "part";
