//! Analytical query adapter over Parquet payloads.
//!
//! A [`ParquetTable`] wraps one immutable columnar payload and answers the
//! three questions the engine asks: how many rows, which columns, and a
//! (optionally filtered, optionally paged) scan of rows as plain JSON maps.
//! The [`TableRegistry`] holds tables under logical names so the paged query
//! path can reach a datastore's payload after its load completed.
//!
//! Row counts come from the Parquet footer metadata; only `scan` ever
//! materializes row data.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, LargeStringArray, ListArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value;

use crate::error::{DatastoreError, Result};
use crate::filters::{row_matches, FilterSelection};

/// Structural index column written by dataframe exporters; never part of the
/// display schema or of scanned rows.
pub const INDEX_COLUMN: &str = "__index_level_0__";

/// One scanned row: column name to raw cell value.
pub type Row = serde_json::Map<String, Value>;

/// A registered Parquet payload.
///
/// Construction validates the payload; all reads re-open the footer, which
/// is cheap against in-memory bytes.
#[derive(Debug, Clone)]
pub struct ParquetTable {
    bytes: Bytes,
}

impl ParquetTable {
    /// Registers a Parquet payload, validating that it can be read.
    ///
    /// # Errors
    ///
    /// Returns a Parquet error if the payload is malformed.
    pub fn new(bytes: Bytes) -> Result<Self> {
        reader_builder(&bytes)?;
        Ok(Self { bytes })
    }

    /// Returns the exact row count from the file metadata, without
    /// materializing any rows.
    ///
    /// # Errors
    ///
    /// Returns a Parquet error if the footer cannot be read.
    pub fn row_count(&self) -> Result<u64> {
        let builder = reader_builder(&self.bytes)?;
        let rows = builder.metadata().file_metadata().num_rows();
        Ok(u64::try_from(rows).unwrap_or(0))
    }

    /// Returns the column names in schema order, excluding the structural
    /// index column.
    ///
    /// # Errors
    ///
    /// Returns a Parquet error if the schema cannot be read.
    pub fn columns(&self) -> Result<Vec<String>> {
        let builder = reader_builder(&self.bytes)?;
        Ok(builder
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .filter(|name| name != INDEX_COLUMN)
            .collect())
    }

    /// Scans rows in storage order.
    ///
    /// When `filter` is set, only rows matching the selection survive; the
    /// `offset`/`limit` window applies after filtering. Omitting `limit`
    /// returns every (matching) row, which is only safe for payloads known
    /// to be small.
    ///
    /// # Errors
    ///
    /// Returns a Parquet error if decoding fails.
    pub fn scan(
        &self,
        filter: Option<&FilterSelection>,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Row>> {
        let reader = reader_builder(&self.bytes)?
            .build()
            .map_err(|e| DatastoreError::parquet(format!("parquet reader build failed: {e}")))?;

        let mut out = Vec::new();
        let mut skipped = 0usize;
        'batches: for batch in reader {
            let batch = batch
                .map_err(|e| DatastoreError::parquet(format!("parquet read batch failed: {e}")))?;
            for row_idx in 0..batch.num_rows() {
                let row = row_to_json(&batch, row_idx);
                if let Some(selection) = filter {
                    if !row_matches(&row, selection) {
                        continue;
                    }
                }
                if skipped < offset {
                    skipped += 1;
                    continue;
                }
                out.push(row);
                if limit.is_some_and(|limit| out.len() >= limit) {
                    break 'batches;
                }
            }
        }
        Ok(out)
    }
}

fn reader_builder(bytes: &Bytes) -> Result<ParquetRecordBatchReaderBuilder<Bytes>> {
    ParquetRecordBatchReaderBuilder::try_new(bytes.clone())
        .map_err(|e| DatastoreError::parquet(format!("parquet reader init failed: {e}")))
}

fn row_to_json(batch: &RecordBatch, row: usize) -> Row {
    let schema = batch.schema();
    let mut out = Row::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        if field.name() == INDEX_COLUMN {
            continue;
        }
        out.insert(field.name().clone(), cell_to_json(batch.column(idx), row));
    }
    out
}

/// Converts one Arrow cell to its JSON value. List cells become arrays;
/// types without a dedicated arm fall back to Arrow's display rendering.
fn cell_to_json(column: &ArrayRef, row: usize) -> Value {
    if column.is_null(row) {
        return Value::Null;
    }

    match column.data_type() {
        DataType::Utf8 => downcast::<StringArray>(column)
            .map_or(Value::Null, |a| Value::String(a.value(row).to_string())),
        DataType::LargeUtf8 => downcast::<LargeStringArray>(column)
            .map_or(Value::Null, |a| Value::String(a.value(row).to_string())),
        DataType::Boolean => {
            downcast::<BooleanArray>(column).map_or(Value::Null, |a| Value::Bool(a.value(row)))
        }
        DataType::Int32 => {
            downcast::<Int32Array>(column).map_or(Value::Null, |a| Value::from(a.value(row)))
        }
        DataType::Int64 => {
            downcast::<Int64Array>(column).map_or(Value::Null, |a| Value::from(a.value(row)))
        }
        DataType::Float32 => downcast::<Float32Array>(column)
            .map_or(Value::Null, |a| Value::from(f64::from(a.value(row)))),
        DataType::Float64 => {
            downcast::<Float64Array>(column).map_or(Value::Null, |a| Value::from(a.value(row)))
        }
        DataType::List(_) => downcast::<ListArray>(column).map_or(Value::Null, |a| {
            let values = a.value(row);
            Value::Array((0..values.len()).map(|i| cell_to_json(&values, i)).collect())
        }),
        DataType::LargeList(_) => downcast::<LargeListArray>(column).map_or(Value::Null, |a| {
            let values = a.value(row);
            Value::Array((0..values.len()).map(|i| cell_to_json(&values, i)).collect())
        }),
        _ => array_value_to_string(column.as_ref(), row)
            .map_or(Value::Null, Value::String),
    }
}

fn downcast<T: 'static>(column: &ArrayRef) -> Option<&T> {
    column.as_any().downcast_ref::<T>()
}

/// Named registration of Parquet payloads.
///
/// The cache registers a datastore's payloads here during load; the paged
/// query path looks them up afterwards. Lookup of an unknown name is the
/// typed [`DatastoreError::TableNotRegistered`], distinct from payload-level
/// Parquet errors.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RwLock<HashMap<String, Arc<ParquetTable>>>,
}

impl TableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload under a logical name, replacing any previous
    /// registration.
    ///
    /// # Errors
    ///
    /// Returns a Parquet error if the payload is malformed.
    pub fn register(&self, name: &str, bytes: Bytes) -> Result<Arc<ParquetTable>> {
        let table = Arc::new(ParquetTable::new(bytes)?);
        self.lock_write()?.insert(name.to_string(), table.clone());
        Ok(table)
    }

    /// Looks up a registered table.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::TableNotRegistered`] for unknown names.
    pub fn get(&self, name: &str) -> Result<Arc<ParquetTable>> {
        self.lock_read()?
            .get(name)
            .cloned()
            .ok_or_else(|| DatastoreError::TableNotRegistered(name.to_string()))
    }

    /// Removes a registration. No-op for unknown names.
    pub fn unregister(&self, name: &str) {
        if let Ok(mut tables) = self.lock_write() {
            tables.remove(name);
        }
    }

    /// Removes every registration.
    pub fn clear(&self) {
        if let Ok(mut tables) = self.lock_write() {
            tables.clear();
        }
    }

    fn lock_read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Arc<ParquetTable>>>> {
        self.tables
            .read()
            .map_err(|_| DatastoreError::InvariantViolation {
                message: "table registry lock poisoned".to_string(),
            })
    }

    fn lock_write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<ParquetTable>>>> {
        self.tables
            .write()
            .map_err(|_| DatastoreError::InvariantViolation {
                message: "table registry lock poisoned".to_string(),
            })
    }
}
