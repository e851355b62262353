//! Error types for build-data providers.

use thiserror::Error;

/// Failure to obtain builds from a build-data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure talking to the CI server.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The CI server answered with a non-success status.
    #[error("CI server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded into build records.
    #[error("malformed build data: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request did not complete in time.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Reading a local build file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
