//! HTTP client for streaming files to disk.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Proxy};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::partial_path;
use crate::user_agent;

/// HTTP client shared by catalog lookups and file transfers.
///
/// Created once per store and reused so connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client with default timeouts and an optional proxy.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] when the proxy URL is
    /// rejected or the TLS backend cannot be initialised.
    pub fn new(proxy: Option<&str>) -> Result<Self, reqwest::Error> {
        Self::new_with_timeouts(proxy, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Builds a client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn new_with_timeouts(
        proxy: Option<&str>,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent());
        if let Some(proxy) = proxy {
            debug!(proxy = %proxy, "routing requests through proxy");
            builder = builder.proxy(Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Streams `url` into `final_path`, returning the number of bytes written.
    ///
    /// The body is written to a `.part` sibling first and renamed once
    /// complete; the partial file is removed on any error.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure, non-success status, or
    /// filesystem failure.
    #[instrument(level = "debug", skip(self, authorization), fields(url = %url, path = %final_path.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        final_path: &Path,
        authorization: Option<&str>,
    ) -> Result<u64, DownloadError> {
        let mut request = self.client.get(url);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let part = partial_path(final_path);
        let mut file = File::create(&part)
            .await
            .map_err(|e| DownloadError::io(&part, e))?;

        let written = match stream_to_file(&mut file, response, url, &part).await {
            Ok(written) => written,
            Err(error) => {
                drop(file);
                if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                    warn!(path = %part.display(), error = %cleanup, "failed to remove partial file");
                }
                return Err(error);
            }
        };
        drop(file);

        tokio::fs::rename(&part, final_path)
            .await
            .map_err(|e| DownloadError::io(final_path, e))?;

        debug!(bytes = written, "transfer complete");
        Ok(written)
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
