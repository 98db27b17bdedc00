//! Engine configuration.
//!
//! Settings follow the environment-variable-with-default convention:
//!
//! - `FLOE_CATALOG_URL` - Base URL serving the catalogue payloads
//!   (default: `http://localhost:8080`)
//! - `FLOE_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `FLOE_MATERIALIZE_ROW_LIMIT` - Largest datastore that is fully
//!   materialized client-side (default: 10000)

use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default largest row count that is fully materialized in memory.
pub const DEFAULT_MATERIALIZE_ROW_LIMIT: u64 = 10_000;

/// Engine settings shared by the storage backend and the datastore cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL serving the catalogue payloads.
    pub catalog_url: String,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Datastores at or below this row count are fully materialized;
    /// larger ones are served page-by-page with predicate pushdown.
    pub materialize_row_limit: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
            materialize_row_limit: DEFAULT_MATERIALIZE_ROW_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but unparseable.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FLOE_CATALOG_URL") {
            config.catalog_url = url;
        }
        if let Ok(raw) = std::env::var("FLOE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_var("FLOE_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Ok(raw) = std::env::var("FLOE_MATERIALIZE_ROW_LIMIT") {
            config.materialize_row_limit = parse_var("FLOE_MATERIALIZE_ROW_LIMIT", &raw)?;
        }

        Ok(config)
    }

    /// Returns the HTTP request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var(name: &str, raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| Error::InvalidConfig {
        message: format!("{name} must be an integer, got '{raw}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.catalog_url, "http://localhost:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.materialize_row_limit, 10_000);
    }

    #[test]
    fn test_deserialize_partial_overrides() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"catalog_url": "https://data.example.org", "materialize_row_limit": 500}"#,
        )
        .expect("valid config");
        assert_eq!(config.catalog_url, "https://data.example.org");
        assert_eq!(config.materialize_row_limit, 500);
        // Unset field falls back to the default.
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        let err = parse_var("FLOE_REQUEST_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
