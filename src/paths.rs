//! Platform-standard locations for the config file, credential cache and error log.
//!
//! Config lives under the user config directory:
//! 1. `$XDG_CONFIG_HOME/beatportdl/beatportdl-config.toml`
//! 2. `$HOME/.config/beatportdl/beatportdl-config.toml`
//! 3. `%APPDATA%\beatportdl\beatportdl-config.toml`
//!
//! The credential cache and the error log live under the user state directory:
//! 1. `$XDG_STATE_HOME/beatportdl/`
//! 2. `$HOME/.local/state/beatportdl/`
//! 3. `%LOCALAPPDATA%\beatportdl\`

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Directory name used under every base directory.
pub const APP_DIR_NAME: &str = "beatportdl";

/// Config file name.
pub const CONFIG_FILENAME: &str = "beatportdl-config.toml";

/// Credential cache file name.
pub const CACHE_FILENAME: &str = "beatportdl-credentials.json";

/// Error log file name.
pub const ERROR_LOG_FILENAME: &str = "beatportdl-err.log";

/// Errors raised while resolving standard paths.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// No usable config base directory.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// No usable state base directory.
    #[error("unable to determine state directory (set XDG_STATE_HOME or HOME)")]
    StateDirUnavailable,
}

/// A resolved file location and whether it currently exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Absolute or base-relative path to the file.
    pub path: PathBuf,
    /// Whether the file was present at resolution time.
    pub exists: bool,
}

impl ResolvedFile {
    fn probe(path: PathBuf) -> Self {
        let exists = path.is_file();
        Self { path, exists }
    }
}

/// Locates the config file.
///
/// # Errors
///
/// Returns [`PathError::ConfigDirUnavailable`] when no base directory is known.
pub fn find_config_file() -> Result<ResolvedFile, PathError> {
    let dir = resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )?;
    Ok(ResolvedFile::probe(dir.join(CONFIG_FILENAME)))
}

/// Locates the credential cache file.
///
/// # Errors
///
/// Returns [`PathError::StateDirUnavailable`] when no base directory is known.
pub fn find_cache_file() -> Result<ResolvedFile, PathError> {
    Ok(ResolvedFile::probe(default_state_dir()?.join(CACHE_FILENAME)))
}

/// Locates the error log file.
///
/// # Errors
///
/// Returns [`PathError::StateDirUnavailable`] when no base directory is known.
pub fn find_error_log_file() -> Result<ResolvedFile, PathError> {
    Ok(ResolvedFile::probe(
        default_state_dir()?.join(ERROR_LOG_FILENAME),
    ))
}

fn default_state_dir() -> Result<PathBuf, PathError> {
    resolve_state_dir(
        sanitize_env_path(env::var_os("XDG_STATE_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("LOCALAPPDATA")),
    )
}

/// Treats unset and blank environment values the same way.
#[must_use]
pub fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

/// Picks the config base directory from already-read environment values.
///
/// # Errors
///
/// Returns [`PathError::ConfigDirUnavailable`] when every source is missing.
pub fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(PathError::ConfigDirUnavailable)
}

/// Picks the state base directory from already-read environment values.
///
/// # Errors
///
/// Returns [`PathError::StateDirUnavailable`] when every source is missing.
pub fn resolve_state_dir(
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
    local_app_data: Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    if let Some(xdg) = xdg_state_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".local").join("state").join(APP_DIR_NAME));
    }
    if let Some(local_app_data) = local_app_data {
        return Ok(local_app_data.join(APP_DIR_NAME));
    }

    Err(PathError::StateDirUnavailable)
}
