//! Startup gate: no download work begins until a session exists.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{Authenticator, CredentialCache, LoginError, load_cache, store_cache};

/// A fresh login was needed and it failed. Fatal for the process.
#[derive(Debug, thiserror::Error)]
#[error("beatport login failed: {source}")]
pub struct BootstrapError {
    /// Why the login failed.
    #[from]
    pub source: LoginError,
}

/// Loads the persisted session, or logs in once and persists the result.
///
/// Any cache load failure (missing, corrupt, expired) triggers exactly one
/// call to [`Authenticator::login`]. A failure to persist a freshly obtained
/// session is only logged: the session is still usable for this run.
///
/// # Errors
///
/// Returns [`BootstrapError`] when the login itself fails.
#[instrument(level = "debug", skip(authenticator), fields(cache = %cache_path.display()))]
pub async fn bootstrap(
    cache_path: &Path,
    authenticator: &dyn Authenticator,
) -> Result<Arc<CredentialCache>, BootstrapError> {
    match load_cache(cache_path) {
        Ok(cache) => {
            info!("Using cached session");
            return Ok(Arc::new(cache));
        }
        Err(reason) => {
            info!(reason = %reason, "No usable cached session; logging in");
        }
    }

    let cache = authenticator.login().await?;

    if let Err(error) = store_cache(&cache, cache_path) {
        warn!(error = %error, "Failed to persist credential cache");
    } else {
        info!(path = %cache_path.display(), "Credential cache saved");
    }

    Ok(Arc::new(cache))
}
