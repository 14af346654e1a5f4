//! beatportdl Core Library
//!
//! This library provides the core functionality for the beatportdl tool,
//! which downloads purchased tracks from Beatport and Beatsource under
//! bounded concurrency.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`paths`] - Platform-standard config, cache and log locations
//! - [`config`] - TOML configuration loading and validation
//! - [`auth`] - Credential cache and the startup login gate
//! - [`catalog`] - Store links and the URL-to-files resolution trait
//! - [`download`] - Streaming file transfer
//! - [`store`] - Per-store API clients implementing resolution and transfer
//! - [`orchestrator`] - Worker pools, active-file registry, batch runs
//! - [`shutdown`] - Two-stage signal handling
//! - [`input`] - Positional arguments and `.txt` URL lists

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod download;
pub mod input;
pub mod orchestrator;
pub mod paths;
pub mod shutdown;
pub mod store;
mod user_agent;

// Re-export commonly used types
pub use auth::{
    Authenticator, BootstrapError, CacheError, CredentialCache, LoginError, PasswordLogin,
    bootstrap, load_cache, store_cache,
};
pub use catalog::{Catalog, FileDescriptor, Link, LinkKind, ResolveError, Store};
pub use config::{AppConfig, ConfigError, load_config, write_config_template};
pub use download::{DownloadError, HttpClient, Transfer};
pub use input::{InputError, expand_inputs};
pub use orchestrator::{
    ActiveFileGuard, ActiveFiles, BatchControl, FileSubmission, JobStats, Orchestrator, PoolError,
    WorkerPools,
};
pub use paths::{PathError, ResolvedFile, find_cache_file, find_config_file, find_error_log_file};
pub use shutdown::{ShutdownAction, ShutdownController, ShutdownState, listen_for_shutdown};
pub use store::{StoreClient, Stores};
