//! Error types and result aliases for Floe.
//!
//! This module defines the shared error types used across all Floe components.
//! Errors are structured for programmatic handling and include context for
//! debugging.

/// The result type used throughout Floe core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fetching a payload failed (transport error or non-2xx response).
    #[error("fetch error: {message}")]
    Fetch {
        /// Description of the fetch failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A path or object was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The engine configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what made the configuration invalid.
        message: String,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new fetch error with the given message.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new fetch error with a source cause.
    #[must_use]
    pub fn fetch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = Error::fetch("connection refused");
        assert_eq!(err.to_string(), "fetch error: connection refused");
    }

    #[test]
    fn test_fetch_error_preserves_source() {
        let source = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = Error::fetch_with_source("request failed", source);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound("cmip6.parquet".to_string());
        assert_eq!(err.to_string(), "not found: cmip6.parquet");
    }
}
