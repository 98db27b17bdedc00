//! The datastore cache: keyed load state machine with coalescing.
//!
//! Per datastore name, a cache slot transitions
//! **absent → loading → {loaded | errored}**; a new load attempt re-enters
//! `loading` from `errored`, and eviction returns a slot to absent. At most
//! one load is ever in flight per name: concurrent callers for the same
//! uncached name share a single load sequence and all observe its terminal
//! state through a per-slot watch channel.
//!
//! Loads are size-adaptive. Small datastores are fully materialized as
//! normalized rows; large ones keep only the row count, display columns and
//! filter index, and serve row data page-by-page with the current filter
//! selection pushed into the table scan. Materializing hundreds of thousands
//! of normalized rows in a browser-session-sized process is not viable, so
//! the paged path trades filtering locality for bounded memory.
//!
//! The cache is an explicitly constructed service: callers own its lifetime
//! and there is no process-global state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::Instrument;

use floe_core::observability::datastore_span;
use floe_core::store_paths::{project_from_path, StorePaths};
use floe_core::value::normalize_field;
use floe_core::{EngineConfig, StorageBackend};

use crate::error::{DatastoreError, Result};
use crate::filters::{row_matches, FilterOptions, FilterSelection};
use crate::table::{Row, TableRegistry};
use crate::uniques::build_filter_options;

/// One loaded datastore's cached state.
#[derive(Debug, Clone)]
pub struct DatastoreEntry {
    /// Normalized rows; empty when the datastore exceeded the
    /// materialization limit (the paged query path serves row data then).
    pub rows: Vec<Row>,
    /// Exact row count of the underlying payload, known even when `rows`
    /// is empty.
    pub total_records: u64,
    /// Display column names in schema order, structural index excluded.
    /// Authoritative even when `rows` is empty.
    pub columns: Vec<String>,
    /// Per-column distinct values for the filter dropdowns.
    pub filter_options: FilterOptions,
    /// Access-control scope inferred from the data's path field.
    pub project: Option<String>,
    /// When the load that produced this entry completed.
    pub last_fetched: DateTime<Utc>,
}

impl DatastoreEntry {
    /// Returns true when every row is held in memory.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        !self.rows.is_empty() || self.total_records == 0
    }
}

/// Load state of one cache slot.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// No slot exists for this name.
    NotLoaded,
    /// A load is in flight.
    Loading,
    /// The load completed; the entry is current.
    Loaded(Arc<DatastoreEntry>),
    /// The most recent load failed with this message.
    Errored(String),
}

struct Slot {
    state: Arc<watch::Sender<LoadState>>,
}

enum Role {
    Loader(Arc<watch::Sender<LoadState>>),
    Waiter(watch::Receiver<LoadState>),
}

/// Keyed cache of datastore entries with coalesced, size-adaptive loads.
pub struct DatastoreCache<S> {
    storage: Arc<S>,
    registry: TableRegistry,
    slots: Mutex<HashMap<String, Slot>>,
    materialize_row_limit: u64,
}

impl<S: StorageBackend> DatastoreCache<S> {
    /// Creates a cache over the given storage backend with default settings.
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_config(storage, &EngineConfig::default())
    }

    /// Creates a cache with explicit engine settings.
    #[must_use]
    pub fn with_config(storage: Arc<S>, config: &EngineConfig) -> Self {
        Self {
            storage,
            registry: TableRegistry::new(),
            slots: Mutex::new(HashMap::new()),
            materialize_row_limit: config.materialize_row_limit,
        }
    }

    /// Loads a datastore, returning the cached entry when one is current.
    ///
    /// Exactly one load sequence runs per name regardless of how many
    /// callers arrive concurrently; late callers await the in-flight load
    /// and observe its terminal state. A slot in `Errored` state re-enters
    /// `Loading` for the caller that reaches it first.
    ///
    /// # Errors
    ///
    /// Returns the load failure for the loading caller, or the recorded
    /// error message for callers that awaited an in-flight load that failed.
    pub async fn load(&self, name: &str) -> Result<Arc<DatastoreEntry>> {
        let role = {
            let mut slots = self.lock_slots()?;
            match slots.get(name) {
                Some(slot) => {
                    let current = slot.state.borrow().clone();
                    match current {
                        LoadState::Loaded(entry) => return Ok(entry),
                        LoadState::Loading => Role::Waiter(slot.state.subscribe()),
                        // The state transition to Loading happens under the
                        // slot-map lock, so exactly one caller wins the
                        // loader role.
                        LoadState::Errored(_) | LoadState::NotLoaded => {
                            slot.state.send_replace(LoadState::Loading);
                            Role::Loader(slot.state.clone())
                        }
                    }
                }
                None => {
                    let (tx, _rx) = watch::channel(LoadState::Loading);
                    let state = Arc::new(tx);
                    slots.insert(
                        name.to_string(),
                        Slot {
                            state: state.clone(),
                        },
                    );
                    Role::Loader(state)
                }
            }
        };

        match role {
            Role::Waiter(rx) => Self::await_in_flight(name, rx).await,
            Role::Loader(state) => {
                let result = self
                    .run_load(name)
                    .instrument(datastore_span("load", name))
                    .await;
                match result {
                    Ok(entry) => {
                        state.send_replace(LoadState::Loaded(entry.clone()));
                        self.restore_slot(name, &state);
                        Ok(entry)
                    }
                    Err(err) => {
                        tracing::warn!(datastore = name, error = %err, "datastore load failed");
                        state.send_replace(LoadState::Errored(err.to_string()));
                        self.restore_slot(name, &state);
                        Err(err)
                    }
                }
            }
        }
    }

    async fn await_in_flight(
        name: &str,
        mut rx: watch::Receiver<LoadState>,
    ) -> Result<Arc<DatastoreEntry>> {
        let terminal = rx
            .wait_for(|state| !matches!(state, LoadState::Loading))
            .await
            .map_err(|_| DatastoreError::InvariantViolation {
                message: format!("load channel for '{name}' closed while loading"),
            })?
            .clone();

        match terminal {
            LoadState::Loaded(entry) => Ok(entry),
            LoadState::Errored(message) => Err(DatastoreError::Load {
                name: name.to_string(),
                message,
            }),
            LoadState::Loading | LoadState::NotLoaded => {
                Err(DatastoreError::InvariantViolation {
                    message: format!("load for '{name}' left the channel in a non-terminal state"),
                })
            }
        }
    }

    /// Re-inserts the loader's slot after completion.
    ///
    /// A load is never cancelled: if the entry was evicted while the load
    /// was in flight, completion re-populates the slot (and waiters on the
    /// original channel still observe the terminal state).
    fn restore_slot(&self, name: &str, state: &Arc<watch::Sender<LoadState>>) {
        if let Ok(mut slots) = self.lock_slots() {
            slots.insert(
                name.to_string(),
                Slot {
                    state: state.clone(),
                },
            );
        }
    }

    async fn run_load(&self, name: &str) -> Result<Arc<DatastoreEntry>> {
        let data_path = StorePaths::datastore_file(name);
        let sidecar_path = StorePaths::sidecar_file(name);

        let (data_bytes, sidecar_bytes) = tokio::try_join!(
            self.storage.get(&data_path),
            self.storage.get(&sidecar_path),
        )?;

        let table = self.registry.register(name, data_bytes)?;
        let sidecar = self.registry.register(&sidecar_path, sidecar_bytes)?;

        let total_records = table.row_count()?;
        let columns = table.columns()?;

        // A broken sidecar costs the filter UI its options, never the load.
        let filter_options = match sidecar.scan(None, None, 0) {
            Ok(rows) => build_filter_options(&rows),
            Err(err) => {
                tracing::warn!(
                    datastore = name,
                    error = %err,
                    "failed to scan sidecar payload; filters will have no options"
                );
                FilterOptions::new()
            }
        };

        let project = table
            .scan(None, Some(1), 0)?
            .first()
            .and_then(|row| row.get("path"))
            .and_then(|cell| normalize_field(cell).values().next().map(str::to_string))
            .and_then(|path| project_from_path(&path));

        let rows = if total_records <= self.materialize_row_limit {
            table
                .scan(None, None, 0)?
                .into_iter()
                .map(normalize_row)
                .collect()
        } else {
            tracing::debug!(
                datastore = name,
                total_records,
                "datastore exceeds materialization limit; serving paged queries"
            );
            Vec::new()
        };

        Ok(Arc::new(DatastoreEntry {
            rows,
            total_records,
            columns,
            filter_options,
            project,
            last_fetched: Utc::now(),
        }))
    }

    /// Returns the loaded entry for a name, if one is cached.
    #[must_use]
    pub fn get_cached(&self, name: &str) -> Option<Arc<DatastoreEntry>> {
        match self.load_state(name) {
            LoadState::Loaded(entry) => Some(entry),
            _ => None,
        }
    }

    /// Returns true while a load for the name is in flight.
    #[must_use]
    pub fn is_loading(&self, name: &str) -> bool {
        matches!(self.load_state(name), LoadState::Loading)
    }

    /// Returns the current load state for a name.
    #[must_use]
    pub fn load_state(&self, name: &str) -> LoadState {
        let Ok(slots) = self.lock_slots() else {
            return LoadState::NotLoaded;
        };
        slots
            .get(name)
            .map_or(LoadState::NotLoaded, |slot| slot.state.borrow().clone())
    }

    /// Evicts one datastore. Safe to call for names that were never loaded.
    pub fn evict(&self, name: &str) {
        if let Ok(mut slots) = self.lock_slots() {
            slots.remove(name);
        }
        self.registry.unregister(name);
        self.registry.unregister(&StorePaths::sidecar_file(name));
    }

    /// Evicts every datastore and drops all table registrations.
    pub fn clear(&self) {
        if let Ok(mut slots) = self.lock_slots() {
            slots.clear();
        }
        self.registry.clear();
    }

    /// Serves one page of rows under the given selection.
    ///
    /// Materialized entries filter in memory; larger datastores push the
    /// selection into the table scan so only the page is materialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the datastore cannot be loaded or scanned.
    pub async fn query_page(
        &self,
        name: &str,
        selection: &FilterSelection,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Row>> {
        let entry = self.load(name).await?;

        if entry.is_materialized() {
            let page = entry
                .rows
                .iter()
                .filter(|row| row_matches(row, selection))
                .skip(offset)
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect();
            return Ok(page);
        }

        let table = self.registry.get(name)?;
        Ok(table
            .scan(Some(selection), limit, offset)?
            .into_iter()
            .map(normalize_row)
            .collect())
    }

    fn lock_slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Slot>>> {
        self.slots
            .lock()
            .map_err(|_| DatastoreError::InvariantViolation {
                message: "datastore cache lock poisoned".to_string(),
            })
    }
}

/// Collapses every cell of a raw row to its canonical JSON shape.
fn normalize_row(row: Row) -> Row {
    row.into_iter()
        .map(|(column, cell)| {
            let normalized = normalize_field(&cell).to_json();
            (column, normalized)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_row_collapses_cells() {
        let mut row = Row::new();
        row.insert("a".to_string(), json!(["only"]));
        row.insert("b".to_string(), json!(["x", "y"]));
        row.insert("c".to_string(), json!([]));

        let normalized = normalize_row(row);
        assert_eq!(normalized.get("a"), Some(&json!("only")));
        assert_eq!(normalized.get("b"), Some(&json!(["x", "y"])));
        assert_eq!(normalized.get("c"), Some(&json!(null)));
    }

    #[test]
    fn test_entry_materialization_flag() {
        let entry = DatastoreEntry {
            rows: Vec::new(),
            total_records: 50_000,
            columns: vec!["path".to_string()],
            filter_options: FilterOptions::new(),
            project: None,
            last_fetched: Utc::now(),
        };
        assert!(!entry.is_materialized());

        let empty = DatastoreEntry {
            total_records: 0,
            ..entry
        };
        assert!(empty.is_materialized());
    }
}
