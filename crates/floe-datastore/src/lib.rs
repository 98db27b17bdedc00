//! # floe-datastore
//!
//! Datastore cache and query engine for the Floe catalogue explorer.
//!
//! This crate implements the client-side analytical data layer:
//!
//! - **Datastore Cache**: Keyed load state machine with concurrent-load
//!   coalescing and size-adaptive materialization
//! - **Table Adapter**: Row counts, schema introspection, and filtered
//!   paged scans over Parquet payloads
//! - **Filter Index**: Per-column distinct values derived from each
//!   datastore's sidecar payload
//! - **Dynamic Narrowing**: Option lists that shrink with the current
//!   selection, with open-dropdown buffering
//! - **Metacatalogue**: The load-once top-level table of all datastores
//!
//! ## Load Flow
//!
//! ```text
//! load(name)
//! ├── cache hit            -> entry returned, no I/O
//! ├── load in flight       -> await the shared watch channel
//! └── cold / errored
//!     ├── fetch {name}.parquet + {name}_uniqs.parquet  (concurrent)
//!     ├── register both with the table adapter
//!     ├── derive count, columns, project scope, filter options
//!     ├── rows <= limit    -> materialize normalized rows
//!     └── rows >  limit    -> leave rows to the paged query path
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use floe_core::{EngineConfig, HttpBackend};
//! use floe_datastore::DatastoreCache;
//!
//! let config = EngineConfig::from_env()?;
//! let storage = Arc::new(HttpBackend::from_config(&config)?);
//! let cache = DatastoreCache::with_config(storage, &config);
//!
//! let entry = cache.load("cmip6_fs38").await?;
//! println!("{} rows, {} columns", entry.total_records, entry.columns.len());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod error;
pub mod filters;
pub mod metacatalog;
pub mod table;
pub mod uniques;

// Re-export main types at crate root
pub use cache::{DatastoreCache, DatastoreEntry, LoadState};
pub use error::{DatastoreError, Result};
pub use filters::{
    compute_dynamic_options, row_matches, DynamicFilterState, FilterOptions, FilterSelection,
};
pub use metacatalog::{CatalogEntry, CatalogStore, FACET_COLUMNS};
pub use table::{ParquetTable, Row, TableRegistry, INDEX_COLUMN};
pub use uniques::{build_filter_options, STRUCTURAL_COLUMNS};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cache::{DatastoreCache, DatastoreEntry, LoadState};
    pub use crate::error::{DatastoreError, Result};
    pub use crate::filters::{
        compute_dynamic_options, DynamicFilterState, FilterOptions, FilterSelection,
    };
    pub use crate::metacatalog::{CatalogEntry, CatalogStore};
    pub use crate::table::{ParquetTable, Row, TableRegistry};
    pub use crate::uniques::build_filter_options;
}
