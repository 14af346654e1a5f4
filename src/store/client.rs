//! Per-store API client: link resolution and track downloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::auth::CredentialCache;
use crate::catalog::{Catalog, FileDescriptor, Link, LinkKind, ResolveError, Store};
use crate::download::{DownloadError, HttpClient, Transfer, output_file_name};

/// Tracks requested per listing page.
const PAGE_SIZE: usize = 100;

/// Upper bound on listing pages followed for one link.
const MAX_PAGES: usize = 200;

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    results: Vec<PageEntry>,
    #[serde(default)]
    next: Option<String>,
}

/// Playlist listings wrap each track in `{ "track": {...} }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageEntry {
    Wrapped { track: TrackSummary },
    Bare(TrackSummary),
}

impl PageEntry {
    fn into_track(self) -> TrackSummary {
        match self {
            Self::Wrapped { track } | Self::Bare(track) => track,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrackSummary {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mix_name: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistSummary>,
}

#[derive(Debug, Deserialize)]
struct ArtistSummary {
    name: String,
}

impl TrackSummary {
    /// `"Artist A, Artist B - Title (Mix)"`, or `None` without a title.
    fn display_name(&self) -> Option<String> {
        let title = self.name.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let mut out = String::new();
        let artists: Vec<&str> = self.artists.iter().map(|a| a.name.trim()).collect();
        if !artists.is_empty() {
            out.push_str(&artists.join(", "));
            out.push_str(" - ");
        }
        out.push_str(title);
        if let Some(mix) = self.mix_name.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            out.push_str(" (");
            out.push_str(mix);
            out.push(')');
        }
        Some(out)
    }
}

#[derive(Debug, Deserialize)]
struct DownloadLink {
    location: String,
}

/// API client for one store, authenticated with the shared session.
#[derive(Debug, Clone)]
pub struct StoreClient {
    store: Store,
    api_base: String,
    http: HttpClient,
    credentials: Arc<CredentialCache>,
}

impl StoreClient {
    /// Creates a client for `store` rooted at `api_base`.
    #[must_use]
    pub fn new(
        store: Store,
        api_base: &str,
        http: HttpClient,
        credentials: Arc<CredentialCache>,
    ) -> Self {
        Self {
            store,
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
            credentials,
        }
    }

    /// Store this client talks to.
    #[must_use]
    pub fn store(&self) -> Store {
        self.store
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ResolveError> {
        let response = self
            .http
            .inner()
            .get(url)
            .header(AUTHORIZATION, self.credentials.authorization())
            .send()
            .await
            .map_err(|source| ResolveError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| ResolveError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn list_tracks(&self, link: Link) -> Result<Vec<FileDescriptor>, ResolveError> {
        let mut files = Vec::new();
        for page in 1..=MAX_PAGES {
            let url = format!(
                "{}/v4/catalog/{}/{}/tracks/?page={page}&per_page={PAGE_SIZE}",
                self.api_base,
                link.kind.collection(),
                link.id
            );
            let listing: TrackPage = self.get_json(&url).await?;
            debug!(page, count = listing.results.len(), "fetched track listing page");

            for entry in listing.results {
                let track = entry.into_track();
                let mut file = FileDescriptor::new(self.store, track.id);
                file.name = track.display_name();
                files.push(file);
            }

            if listing.next.is_none() {
                return Ok(files);
            }
        }
        warn!(
            store = %self.store,
            kind = link.kind.collection(),
            id = link.id,
            pages = MAX_PAGES,
            tracks = files.len(),
            "track listing truncated; more pages remain"
        );
        Ok(files)
    }

    async fn download_location(&self, file: &FileDescriptor) -> Result<String, DownloadError> {
        let url = format!("{}/v4/catalog/tracks/{}/download/", self.api_base, file.track_id);
        let response = self
            .http
            .inner()
            .get(&url)
            .header(AUTHORIZATION, self.credentials.authorization())
            .send()
            .await
            .map_err(|e| DownloadError::network(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(&url, status.as_u16()));
        }

        let link: DownloadLink = response
            .json()
            .await
            .map_err(|e| DownloadError::decode(&url, e.to_string()))?;
        if url::Url::parse(&link.location).is_err() {
            return Err(DownloadError::invalid_url(link.location));
        }
        Ok(link.location)
    }
}

#[async_trait]
impl Catalog for StoreClient {
    #[instrument(level = "debug", skip(self), fields(store = %self.store))]
    async fn resolve(&self, url: &str) -> Result<Vec<FileDescriptor>, ResolveError> {
        let link = Link::parse(url)?;
        if link.store != self.store {
            return Err(ResolveError::unsupported(url));
        }
        match link.kind {
            LinkKind::Track => Ok(vec![FileDescriptor::new(self.store, link.id)]),
            LinkKind::Release | LinkKind::Chart | LinkKind::Playlist => {
                self.list_tracks(link).await
            }
        }
    }
}

#[async_trait]
impl Transfer for StoreClient {
    #[instrument(level = "debug", skip(self, output_dir), fields(file_id = %file.file_id()))]
    async fn transfer(
        &self,
        file: &FileDescriptor,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let location = self.download_location(file).await?;
        let path = output_dir.join(output_file_name(file, &location));
        // The signed location URL carries its own authorization.
        let bytes = self.http.download_to_path(&location, &path, None).await?;
        debug!(bytes, path = %path.display(), "track saved");
        Ok(path)
    }
}
