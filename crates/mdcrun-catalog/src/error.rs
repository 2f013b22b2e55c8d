//! Error types for mdcrun-catalog

use thiserror::Error;

/// Catalog error type
#[derive(Debug, Error)]
pub enum Error {
    /// Remote source not reachable or request failed
    #[error("network error: {0}")]
    Network(String),

    /// Remote source answered with a non-success status
    #[error("remote returned HTTP {status} for {url}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response or cache body could not be decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Remote entry name cannot be used as a local file name
    #[error("invalid automation name: {0}")]
    InvalidName(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
