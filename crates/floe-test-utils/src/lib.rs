//! Shared test utilities for Floe integration tests.
//!
//! This crate provides:
//! - [`RecordingBackend`]: In-memory storage with operation recording
//! - [`TableFixture`]: Builder for Parquet payload fixtures
//! - Factory functions for datastore and sidecar payloads
//!
//! # Example
//!
//! ```rust,ignore
//! use floe_test_utils::{RecordingBackend, TableFixture};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let backend = RecordingBackend::new();
//!     backend.insert("cmip6.parquet", TableFixture::new()
//!         .string_column("path", &[Some("/g/data/fs38/a.nc")])
//!         .finish());
//!     // ... run test ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod storage;

pub use fixtures::*;
pub use storage::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("floe=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
