//! Error types for image downloads and progress persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while downloading a card image.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error while requesting or streaming the image.
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The image URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The image URL that timed out.
        url: String,
    },

    /// HTTP error response from the image host.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The image URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The server returned success with an empty body.
    #[error("empty response body from {url}")]
    EmptyBody {
        /// The image URL that returned no data.
        url: String,
    },

    /// The record carried a malformed image URL.
    #[error("invalid image URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Filesystem error while writing the image.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The progress state file could not be persisted. The only variant the
    /// pipeline treats as fatal: losing the state file breaks resumability.
    #[error("failed to persist progress state at {path}: {source}")]
    State {
        /// The state file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an empty body error.
    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::EmptyBody { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a state persistence error.
    pub fn state(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::State {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should abort the whole run rather than just fail
    /// the one card.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}
