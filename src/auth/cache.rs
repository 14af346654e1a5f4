//! Persisted session tokens.
//!
//! The cache is a small JSON document written to the state directory with
//! owner-only permissions. Any problem reading it is reported as a
//! [`CacheError`] so the caller can fall back to a fresh login.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Seconds of validity that must remain for a cached token to be reused.
const EXPIRY_MARGIN_SECS: u64 = 60;

/// Errors for loading or persisting the credential cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No cache file at the expected path.
    #[error("credential cache not found at {path}")]
    Missing {
        /// Expected location.
        path: PathBuf,
    },
    /// Filesystem I/O failed.
    #[error("credential cache I/O error at {path}: {source}")]
    Io {
        /// Location involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Payload is not a valid cache document.
    #[error("credential cache at {path} is corrupt: {source}")]
    Corrupt {
        /// Location involved.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Payload parsed but carries no usable token.
    #[error("credential cache holds no access token")]
    EmptyToken,
    /// Token is past (or too close to) its expiry.
    #[error("cached session expired")]
    Expired,
}

/// Authenticated session state shared by both store clients.
///
/// Token values are redacted in `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialCache {
    /// Bearer token sent with every API request.
    pub access_token: String,
    /// Refresh token, when the server issued one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token scheme, usually `Bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds from `issued_at`; 0 means the server gave none.
    #[serde(default)]
    pub expires_in: u64,
    /// Unix timestamp (seconds) when the token was obtained.
    #[serde(default)]
    pub issued_at: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl CredentialCache {
    /// Creates a cache entry stamped with the current time.
    #[must_use]
    pub fn issued_now(access_token: String, refresh_token: Option<String>, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_in,
            issued_at: unix_now(),
        }
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Whether the token is unusable at `now` (unix seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        if self.expires_in == 0 {
            return false;
        }
        let deadline = self.issued_at.saturating_add(self.expires_in);
        now.saturating_add(EXPIRY_MARGIN_SECS) >= deadline
    }

    /// Checks that the cache can be used for API calls right now.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::EmptyToken`] or [`CacheError::Expired`].
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.access_token.trim().is_empty() {
            return Err(CacheError::EmptyToken);
        }
        if self.is_expired_at(unix_now()) {
            return Err(CacheError::Expired);
        }
        Ok(())
    }
}

/// Loads and validates the cache at `path`.
///
/// # Errors
///
/// Returns [`CacheError`] when the file is missing, unreadable, corrupt,
/// tokenless, or expired.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn load_cache(path: &Path) -> Result<CredentialCache, CacheError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(CacheError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let cache: CredentialCache =
        serde_json::from_slice(&bytes).map_err(|source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
    cache.validate()?;
    debug!("credential cache loaded");
    Ok(cache)
}

/// Writes the cache to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`CacheError::Io`] on filesystem failure.
#[instrument(level = "debug", skip(cache), fields(path = %path.display()))]
pub fn store_cache(cache: &CredentialCache, path: &Path) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let payload = serde_json::to_vec_pretty(cache).map_err(|source| CacheError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, payload).map_err(io_err)?;
    set_owner_only_permissions(path).map_err(io_err)?;
    Ok(())
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
