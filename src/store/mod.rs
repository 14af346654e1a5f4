//! Store API clients and the router between them.
//!
//! Both stores share one [`CredentialCache`](crate::auth::CredentialCache);
//! [`Stores`] picks the right [`StoreClient`] from the link's host or the
//! file's store.

mod client;

pub use client::StoreClient;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::catalog::{Catalog, FileDescriptor, Link, ResolveError, Store};
use crate::download::{DownloadError, Transfer};

/// The primary and secondary store clients behind one [`Catalog`] and
/// [`Transfer`].
#[derive(Debug, Clone)]
pub struct Stores {
    beatport: StoreClient,
    beatsource: StoreClient,
}

impl Stores {
    /// Pairs the two clients.
    #[must_use]
    pub fn new(beatport: StoreClient, beatsource: StoreClient) -> Self {
        Self {
            beatport,
            beatsource,
        }
    }

    /// Client for `store`.
    #[must_use]
    pub fn client(&self, store: Store) -> &StoreClient {
        match store {
            Store::Beatport => &self.beatport,
            Store::Beatsource => &self.beatsource,
        }
    }
}

#[async_trait]
impl Catalog for Stores {
    async fn resolve(&self, url: &str) -> Result<Vec<FileDescriptor>, ResolveError> {
        let link = Link::parse(url)?;
        self.client(link.store).resolve(url).await
    }
}

#[async_trait]
impl Transfer for Stores {
    async fn transfer(
        &self,
        file: &FileDescriptor,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        self.client(file.store).transfer(file, output_dir).await
    }
}
