//! Error types for mdcrun-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Matching was attempted against an empty catalog
    #[error("no automations available to match against")]
    EmptyCatalog,

    /// Model reply could not be interpreted
    #[error("invalid match reply: {0}")]
    InvalidReply(String),

    /// Model picked an index outside the catalog
    #[error("match index {index} out of range for {len} automations")]
    IndexOutOfRange {
        /// Index returned by the model
        index: i64,
        /// Catalog size
        len: usize,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] mdcrun_llm::Error),

    /// Catalog error
    #[error("catalog error: {0}")]
    Catalog(#[from] mdcrun_catalog::Error),

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
