//! The metacatalogue: the top-level table listing every datastore.
//!
//! A single small Parquet payload holds one row per datastore with summary
//! facets. It is loaded once per session, fully materialized (no pagination
//! tier), and cleared explicitly. The four facet columns stay sequences even
//! for a single element, and each gets a lower-cased comma-joined searchable
//! string computed at load time so free-text search never re-walks the facet
//! lists.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use floe_core::value::normalize_facet;
use floe_core::{StorageBackend, StorePaths};

use crate::error::Result;
use crate::table::{ParquetTable, Row};

/// The list-valued facet columns of the metacatalogue.
pub const FACET_COLUMNS: &[&str] = &["model", "realm", "frequency", "variable"];

/// One row of the metacatalogue.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Unique datastore name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Model facet values.
    pub model: Vec<String>,
    /// Realm facet values.
    pub realm: Vec<String>,
    /// Frequency facet values.
    pub frequency: Vec<String>,
    /// Variable facet values.
    pub variable: Vec<String>,
    /// Raw configuration text, opaque to the engine.
    pub yaml: Option<String>,
    search: SearchStrings,
}

/// Pre-lowered search text, one string per searchable field.
#[derive(Debug, Clone, Default)]
struct SearchStrings {
    name: String,
    description: String,
    model: String,
    realm: String,
    frequency: String,
    variable: String,
}

fn searchable(values: &[String]) -> String {
    values.join(",").to_lowercase()
}

impl CatalogEntry {
    fn from_row(row: &Row) -> Self {
        let name = string_field(row, "name");
        let description = string_field(row, "description");
        let model = facet_field(row, "model");
        let realm = facet_field(row, "realm");
        let frequency = facet_field(row, "frequency");
        let variable = facet_field(row, "variable");

        let search = SearchStrings {
            name: name.to_lowercase(),
            description: description.to_lowercase(),
            model: searchable(&model),
            realm: searchable(&realm),
            frequency: searchable(&frequency),
            variable: searchable(&variable),
        };

        Self {
            name,
            description,
            model,
            realm,
            frequency,
            variable,
            yaml: row.get("yaml").and_then(Value::as_str).map(String::from),
            search,
        }
    }

    /// Returns a facet's values by column name, or `None` for non-facet
    /// columns. Facet columns are listed in [`FACET_COLUMNS`].
    #[must_use]
    pub fn facet(&self, column: &str) -> Option<&[String]> {
        match column {
            "model" => Some(&self.model),
            "realm" => Some(&self.realm),
            "frequency" => Some(&self.frequency),
            "variable" => Some(&self.variable),
            _ => None,
        }
    }

    /// Case-insensitive free-text match across name, description, and the
    /// four facets.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.search.name.contains(&needle)
            || self.search.description.contains(&needle)
            || self.search.model.contains(&needle)
            || self.search.realm.contains(&needle)
            || self.search.frequency.contains(&needle)
            || self.search.variable.contains(&needle)
    }
}

fn string_field(row: &Row, column: &str) -> String {
    row.get(column)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn facet_field(row: &Row, column: &str) -> Vec<String> {
    normalize_facet(row.get(column).unwrap_or(&Value::Null))
}

#[derive(Default)]
struct CatalogState {
    entries: Option<Arc<Vec<CatalogEntry>>>,
    error: Option<String>,
}

/// Load-once store for the metacatalogue.
///
/// `fetch` is idempotent while the catalogue is loaded without a recorded
/// error; the state mutex is held across the load, so concurrent fetches
/// serialize and late callers observe the loaded state and no-op.
pub struct CatalogStore<S> {
    storage: Arc<S>,
    state: Mutex<CatalogState>,
}

impl<S: StorageBackend> CatalogStore<S> {
    /// Creates a store over the given storage backend.
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            state: Mutex::new(CatalogState::default()),
        }
    }

    /// Loads the metacatalogue if it is not already loaded cleanly.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be fetched or decoded; the
    /// error message is also recorded so a later `fetch` re-attempts.
    pub async fn fetch(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.entries.is_some() && state.error.is_none() {
            return Ok(());
        }

        match self.load_entries().await {
            Ok(entries) => {
                tracing::debug!(datastores = entries.len(), "metacatalogue loaded");
                state.entries = Some(Arc::new(entries));
                state.error = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "metacatalogue load failed");
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn load_entries(&self) -> Result<Vec<CatalogEntry>> {
        let bytes = self.storage.get(StorePaths::METACATALOG).await?;
        let table = ParquetTable::new(bytes)?;
        let rows = table.scan(None, None, 0)?;
        Ok(rows.iter().map(CatalogEntry::from_row).collect())
    }

    /// Returns the loaded entries, if any.
    pub async fn entries(&self) -> Option<Arc<Vec<CatalogEntry>>> {
        self.state.lock().await.entries.clone()
    }

    /// Returns the recorded load error, if any.
    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// Free-text search across the loaded catalogue.
    ///
    /// An empty needle matches everything. Returns an empty list when the
    /// catalogue is not loaded.
    pub async fn search(&self, needle: &str) -> Vec<CatalogEntry> {
        match self.entries().await {
            Some(entries) => entries
                .iter()
                .filter(|entry| entry.matches_search(needle))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Resets to the initial empty, error-free state.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries = None;
        state.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_from(pairs: &[(&str, Value)]) -> CatalogEntry {
        let row: Row = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        CatalogEntry::from_row(&row)
    }

    #[test]
    fn test_facets_stay_sequences_for_single_elements() {
        let entry = entry_from(&[
            ("name", json!("cmip6_fs38")),
            ("description", json!("CMIP6 replica")),
            ("model", json!(["ACCESS-ESM1-5"])),
            ("realm", json!("ocean")),
        ]);

        // One element is still a sequence; a scalar cell is promoted to one.
        assert_eq!(entry.model, vec!["ACCESS-ESM1-5".to_string()]);
        assert_eq!(entry.realm, vec!["ocean".to_string()]);
        assert!(entry.frequency.is_empty());
    }

    #[test]
    fn test_search_matches_name_and_facets() {
        let entry = entry_from(&[
            ("name", json!("cmip6_fs38")),
            ("description", json!("CMIP6 replica datasets")),
            ("model", json!(["ACCESS-ESM1-5", "ACCESS-CM2"])),
            ("variable", json!(["tas", "pr"])),
        ]);

        assert!(entry.matches_search("FS38"));
        assert!(entry.matches_search("replica"));
        assert!(entry.matches_search("access-cm2"));
        assert!(entry.matches_search("tas"));
        assert!(!entry.matches_search("era5"));
    }

    #[test]
    fn test_facet_lookup_by_column_name() {
        let entry = entry_from(&[
            ("name", json!("x")),
            ("model", json!(["ACCESS-CM2"])),
            ("variable", json!(["tas"])),
        ]);

        for column in FACET_COLUMNS {
            assert!(entry.facet(column).is_some(), "facet {column} missing");
        }
        assert_eq!(entry.facet("model"), Some(&["ACCESS-CM2".to_string()][..]));
        assert_eq!(entry.facet("path"), None);
    }

    #[test]
    fn test_yaml_absent_is_none() {
        let entry = entry_from(&[("name", json!("x")), ("description", json!("y"))]);
        assert_eq!(entry.yaml, None);

        let entry = entry_from(&[("name", json!("x")), ("yaml", json!("sources: {}"))]);
        assert_eq!(entry.yaml.as_deref(), Some("sources: {}"));
    }
}
