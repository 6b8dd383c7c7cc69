//! Errors raised while fetching or replaying records.

use thiserror::Error;

/// Failure while fetching a page or reading the blob cache.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("cannot parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
