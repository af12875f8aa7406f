//! Error types for ISC Core
//!
//! The save path never surfaces errors to the host; these cover option
//! loading and the maintenance operations that report back to an operator.

use isc_meta::{ContentId, StoreError};
use std::path::PathBuf;

/// Main ISC error type
#[derive(Debug, thiserror::Error)]
pub enum IscError {
    /// Meta store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Options could not be parsed or are inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Options file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The host does not know the content item
    #[error("unknown content item {0}")]
    UnknownContent(ContentId),
}

impl From<toml::de::Error> for IscError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type for ISC operations
pub type Result<T> = std::result::Result<T, IscError>;
