//! TOML-backed application configuration.
//!
//! The config is read once at startup and never mutated afterwards; the
//! orchestrator and both store clients only ever borrow it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

/// Default number of concurrent URL-level jobs.
pub const DEFAULT_MAX_GLOBAL_WORKERS: usize = 15;

/// Default number of concurrent file transfers.
pub const DEFAULT_MAX_DOWNLOAD_WORKERS: usize = 15;

const MIN_WORKERS: usize = 1;
const MAX_WORKERS: usize = 100;

/// Template written when no config file exists yet.
pub const CONFIG_TEMPLATE: &str = r#"# beatportdl configuration

# Account credentials (required)
username = ""
password = ""

# Where downloaded files are written
downloads_directory = "."

# Concurrent URL jobs and concurrent file transfers (1..=100)
max_global_workers = 15
max_download_workers = 15

# Optional HTTP(S) proxy, e.g. "http://127.0.0.1:8080"
# proxy = ""

# Append warnings and errors to beatportdl-err.log in the state directory
write_error_log = false
"#;

/// Errors raised while loading or validating the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown/mistyped keys.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The template could not be written.
    #[error("failed to write config template '{path}': {source}")]
    Write {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Application configuration.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    /// Account user name.
    pub username: String,
    /// Account password (never logged).
    pub password: String,
    /// Output directory for downloaded files.
    pub downloads_directory: PathBuf,
    /// Capacity of the URL-job pool.
    pub max_global_workers: usize,
    /// Capacity of the file-transfer pool.
    pub max_download_workers: usize,
    /// Optional proxy URL applied to every request.
    pub proxy: Option<String>,
    /// Whether warnings and errors are appended to the error log file.
    pub write_error_log: bool,
    /// Override for the primary store API base URL.
    pub beatport_api_url: Option<String>,
    /// Override for the secondary store API base URL.
    pub beatsource_api_url: Option<String>,
    /// Optional OAuth client id sent with the login request.
    pub client_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            downloads_directory: PathBuf::from("."),
            max_global_workers: DEFAULT_MAX_GLOBAL_WORKERS,
            max_download_workers: DEFAULT_MAX_DOWNLOAD_WORKERS,
            proxy: None,
            write_error_log: false,
            beatport_api_url: None,
            beatsource_api_url: None,
            client_id: None,
        }
    }
}

// Redacts the password.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("downloads_directory", &self.downloads_directory)
            .field("max_global_workers", &self.max_global_workers)
            .field("max_download_workers", &self.max_download_workers)
            .field("proxy", &self.proxy)
            .field("write_error_log", &self.write_error_log)
            .field("beatport_api_url", &self.beatport_api_url)
            .field("beatsource_api_url", &self.beatsource_api_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl AppConfig {
    /// Parses and validates a config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates ranges and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_workers("max_global_workers", self.max_global_workers)?;
        validate_workers("max_download_workers", self.max_download_workers)?;

        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "username",
                reason: "must not be empty".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ConfigError::Invalid {
                field: "password",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(proxy) = self.proxy.as_deref()
            && url::Url::parse(proxy).is_err()
        {
            return Err(ConfigError::Invalid {
                field: "proxy",
                reason: format!("'{proxy}' is not a valid URL"),
            });
        }
        Ok(())
    }
}

fn validate_workers(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if (MIN_WORKERS..=MAX_WORKERS).contains(&value) {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        field,
        reason: format!("{value}. Expected range: {MIN_WORKERS}..={MAX_WORKERS}"),
    })
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is unreadable, malformed or invalid.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = AppConfig::from_toml_str(&raw, path)?;
    debug!(?config, "config loaded");
    Ok(config)
}

/// Writes [`CONFIG_TEMPLATE`] to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Write`] on I/O failure.
pub fn write_config_template(path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, CONFIG_TEMPLATE).map_err(write_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn parse(raw: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_toml_str(raw, Path::new("test.toml"))
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse("username = \"dj\"\npassword = \"pw\"\n").unwrap();
        assert_eq!(config.max_global_workers, DEFAULT_MAX_GLOBAL_WORKERS);
        assert_eq!(config.max_download_workers, DEFAULT_MAX_DOWNLOAD_WORKERS);
        assert_eq!(config.downloads_directory, PathBuf::from("."));
        assert!(config.proxy.is_none());
        assert!(!config.write_error_log);
    }

    #[test]
    fn test_full_config_parses_every_field() {
        let config = parse(
            r#"
            username = "dj"
            password = "pw"
            downloads_directory = "/music"
            max_global_workers = 3
            max_download_workers = 7
            proxy = "http://127.0.0.1:8080"
            write_error_log = true
            beatport_api_url = "http://localhost:1"
            client_id = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.downloads_directory, PathBuf::from("/music"));
        assert_eq!(config.max_global_workers, 3);
        assert_eq!(config.max_download_workers, 7);
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:8080"));
        assert!(config.write_error_log);
        assert_eq!(config.beatport_api_url.as_deref(), Some("http://localhost:1"));
        assert_eq!(config.client_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = parse("username = \"dj\"\npassword = \"pw\"\nquality = \"lossless\"\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = parse("username = \"dj\"\npassword = \"pw\"\nmax_download_workers = 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "max_download_workers",
                ..
            })
        ));
    }

    #[test]
    fn test_too_many_workers_rejected() {
        let result = parse("username = \"dj\"\npassword = \"pw\"\nmax_global_workers = 101\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "max_global_workers",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let result = parse("max_global_workers = 2\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "username",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let result = parse("username = \"dj\"\npassword = \"pw\"\nproxy = \"not a url\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field: "proxy", .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = parse("username = \"dj\"\npassword = \"hunter2\"\n").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_template_round_trips_but_needs_credentials() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("beatportdl-config.toml");
        write_config_template(&path).unwrap();
        assert!(path.is_file());

        let result = load_config(&path);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "username",
                ..
            })
        ));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let result = load_config(&temp.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
