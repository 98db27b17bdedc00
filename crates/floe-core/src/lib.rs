//! # floe-core
//!
//! Core abstractions for the Floe datastore catalogue engine.
//!
//! This crate provides the foundational types used across all Floe components:
//!
//! - **Storage Backends**: Read-only fetch interfaces for catalogue payloads
//!   (HTTP in production, in-memory for tests)
//! - **Canonical Values**: The normalized absent/scalar/sequence cell
//!   representation used for all filtering and display
//! - **Store Paths**: The single source of truth for payload file naming
//! - **Error Types**: Shared error definitions and result types
//! - **Configuration**: Engine settings with environment overrides
//!
//! ## Crate Boundary
//!
//! `floe-core` is the **only** crate allowed to define shared primitives.
//! The datastore engine builds on these contracts and never reaches around
//! them.
//!
//! ## Example
//!
//! ```rust
//! use floe_core::prelude::*;
//!
//! // Cell values of any source shape normalize to one canonical form.
//! let cell = serde_json::json!(["daily", "monthly"]);
//! let value = normalize_field(&cell);
//! assert!(value.matches("DAILY"));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod storage;
pub mod store_paths;
pub mod value;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use floe_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::{Error, Result};
    pub use crate::http::HttpBackend;
    pub use crate::storage::{MemoryBackend, StorageBackend};
    pub use crate::store_paths::{project_from_path, StorePaths};
    pub use crate::value::{normalize_facet, normalize_field, CanonicalValue};
}

// Re-export key types at crate root for ergonomics
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use http::HttpBackend;
pub use observability::{datastore_span, init_logging, LogFormat};
pub use storage::{MemoryBackend, StorageBackend};
pub use store_paths::{project_from_path, StorePaths};
pub use value::{normalize_facet, normalize_field, CanonicalValue};
