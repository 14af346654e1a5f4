//! Store catalog: turning a user-supplied link into downloadable files.
//!
//! # Architecture
//!
//! - [`Store`] - The primary (Beatport) and secondary (Beatsource) stores
//! - [`Link`] - A parsed store web link (kind + numeric id)
//! - [`FileDescriptor`] - One downloadable track, keyed for deduplication
//! - [`Catalog`] - Async trait the orchestrator resolves URLs through

mod error;
mod link;

pub use error::ResolveError;
pub use link::{Link, LinkKind};

use std::fmt;

use async_trait::async_trait;

/// One of the two related stores sharing an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Store {
    /// Primary store.
    Beatport,
    /// Secondary store.
    Beatsource,
}

impl Store {
    /// Stable lowercase name, used in registry keys and paths.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beatport => "beatport",
            Self::Beatsource => "beatsource",
        }
    }

    /// Default public API base URL.
    #[must_use]
    pub fn default_api_url(self) -> &'static str {
        match self {
            Self::Beatport => "https://api.beatport.com",
            Self::Beatsource => "https://api.beatsource.com",
        }
    }

    /// Maps a web host (`www.beatport.com`, `beatsource.com`) to its store.
    #[must_use]
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.strip_prefix("www.").unwrap_or(host);
        match host {
            "beatport.com" => Some(Self::Beatport),
            "beatsource.com" => Some(Self::Beatsource),
            _ => None,
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single downloadable track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Store the track belongs to.
    pub store: Store,
    /// Store-side numeric track id.
    pub track_id: u64,
    /// Human-readable name used for the output file, when known.
    pub name: Option<String>,
}

impl FileDescriptor {
    /// Creates a descriptor without a display name.
    #[must_use]
    pub fn new(store: Store, track_id: u64) -> Self {
        Self {
            store,
            track_id,
            name: None,
        }
    }

    /// Attaches a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Identifier used by the active-file registry (`"<store>:<track_id>"`).
    #[must_use]
    pub fn file_id(&self) -> String {
        format!("{}:{}", self.store, self.track_id)
    }
}

/// Resolves a user-supplied URL into the files it refers to.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns every downloadable file behind `url`.
    async fn resolve(&self, url: &str) -> Result<Vec<FileDescriptor>, ResolveError>;
}
