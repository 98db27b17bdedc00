//! Observability infrastructure for Floe.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors used across the engine.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `floe_datastore=debug`)
///
/// # Example
///
/// ```rust
/// use floe_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for datastore operations with standard fields.
///
/// # Example
///
/// ```rust
/// use floe_core::observability::datastore_span;
///
/// let span = datastore_span("load", "cmip6");
/// let _guard = span.enter();
/// // ... do datastore operation
/// ```
#[must_use]
pub fn datastore_span(operation: &str, datastore: &str) -> Span {
    tracing::info_span!(
        "datastore",
        op = operation,
        datastore = datastore,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_succeeds() {
        // Should not panic (uses Once internally)
        init_logging(LogFormat::Pretty);
        init_logging(LogFormat::Pretty); // Second call should be no-op
    }

    #[test]
    fn test_span_helper_creates_span() {
        let span = datastore_span("load", "cmip6");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }
}
