//! Error types for catalog resolution.

use thiserror::Error;

/// Errors raised while resolving a URL into files.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input is not a URL at all.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending input.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A URL on an unknown host, or an unsupported link kind.
    #[error("unsupported link: {url}")]
    UnsupportedLink {
        /// Offending input.
        url: String,
    },

    /// The API could not be reached.
    #[error("network error resolving {url}: {source}")]
    Network {
        /// Request URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("HTTP {status} resolving {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// The API response did not have the expected shape.
    #[error("unexpected catalog response from {url}: {reason}")]
    Decode {
        /// Request URL.
        url: String,
        /// What went wrong.
        reason: String,
    },
}

impl ResolveError {
    /// Builds an [`ResolveError::UnsupportedLink`].
    #[must_use]
    pub fn unsupported(url: impl Into<String>) -> Self {
        Self::UnsupportedLink { url: url.into() }
    }
}
