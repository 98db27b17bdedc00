//! Error types for datastore engine operations.

use thiserror::Error;

/// Result type alias for datastore operations.
pub type Result<T> = std::result::Result<T, DatastoreError>;

/// Errors that can occur during datastore operations.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// Fetching a catalogue payload failed.
    #[error(transparent)]
    Fetch(#[from] floe_core::Error),

    /// A Parquet payload could not be decoded or scanned.
    #[error("parquet error: {message}")]
    Parquet {
        /// Description of the Parquet failure.
        message: String,
    },

    /// A query was issued against a table that was never registered.
    #[error("table not registered: {0}")]
    TableNotRegistered(String),

    /// A datastore load failed end-to-end.
    #[error("failed to load datastore '{name}': {message}")]
    Load {
        /// The datastore that failed to load.
        name: String,
        /// Description of the load failure.
        message: String,
    },

    /// An invariant that should always hold was violated.
    #[error("invariant violation: {message}")]
    InvariantViolation {
        /// Description of the violated invariant.
        message: String,
    },
}

impl DatastoreError {
    /// Creates a new Parquet error with the given message.
    #[must_use]
    pub fn parquet(message: impl Into<String>) -> Self {
        Self::Parquet {
            message: message.into(),
        }
    }
}
