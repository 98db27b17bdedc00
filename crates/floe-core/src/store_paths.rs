//! Canonical storage paths for catalogue payloads.
//!
//! This module is the **single source of truth** for payload naming. All
//! fetches go through these functions; no hardcoded path strings should
//! exist outside this module.
//!
//! # Payload Layout
//!
//! ```text
//! {base_url}/
//! ├── metacatalog.parquet        # top-level table listing every datastore
//! ├── {name}.parquet             # one datastore's row data
//! └── {name}_uniqs.parquet       # sidecar: one aggregated row of distinct
//!                                #   per-column values for filter dropdowns
//! ```

/// Canonical path generator for catalogue payloads.
///
/// # Example
///
/// ```
/// use floe_core::store_paths::StorePaths;
///
/// assert_eq!(StorePaths::METACATALOG, "metacatalog.parquet");
/// assert_eq!(StorePaths::datastore_file("cmip6"), "cmip6.parquet");
/// assert_eq!(StorePaths::sidecar_file("cmip6"), "cmip6_uniqs.parquet");
/// ```
pub struct StorePaths;

impl StorePaths {
    /// The metacatalogue payload (entry point for the browse-all view).
    pub const METACATALOG: &'static str = "metacatalog.parquet";

    /// Returns the row-data payload path for a datastore.
    #[must_use]
    pub fn datastore_file(name: &str) -> String {
        format!("{name}.parquet")
    }

    /// Returns the sidecar unique-values payload path for a datastore.
    #[must_use]
    pub fn sidecar_file(name: &str) -> String {
        format!("{name}_uniqs.parquet")
    }
}

/// Prefix under which project-scoped data lives on the storage filesystem.
const PROJECT_PREFIX: &str = "/g/data/";

/// Extracts the access-control project scope from a data path.
///
/// The scope is the first path segment after the fixed `/g/data/` prefix:
/// `/g/data/fs38/published/...` → `fs38`. Returns `None` when the prefix is
/// absent or not followed by a segment.
#[must_use]
pub fn project_from_path(path: &str) -> Option<String> {
    let start = path.find(PROJECT_PREFIX)? + PROJECT_PREFIX.len();
    let segment = path[start..].split('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datastore_paths_follow_convention() {
        assert_eq!(StorePaths::datastore_file("era5"), "era5.parquet");
        assert_eq!(StorePaths::sidecar_file("era5"), "era5_uniqs.parquet");
    }

    #[test]
    fn test_project_extraction() {
        assert_eq!(
            project_from_path("/g/data/fs38/published/ACCESS-ESM1-5/file.nc"),
            Some("fs38".to_string())
        );
    }

    #[test]
    fn test_project_extraction_bare_segment() {
        assert_eq!(project_from_path("/g/data/xp65"), Some("xp65".to_string()));
    }

    #[test]
    fn test_project_extraction_unmatched() {
        assert_eq!(project_from_path("/scratch/abc/file.nc"), None);
        assert_eq!(project_from_path("/g/data/"), None);
        assert_eq!(project_from_path(""), None);
    }
}
