//! Pre-built Parquet fixtures for common test scenarios.
//!
//! Provides a builder for bespoke payloads plus factory functions for the
//! standard datastore/sidecar pair.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, ListBuilder, StringArray, StringBuilder};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;

/// Builder for single-batch Parquet payloads.
///
/// Column order follows insertion order; the schema is derived from the
/// built arrays so list item fields always line up.
#[derive(Debug, Default)]
pub struct TableFixture {
    columns: Vec<(String, ArrayRef)>,
}

impl TableFixture {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a nullable Utf8 column.
    #[must_use]
    pub fn string_column(mut self, name: &str, values: &[Option<&str>]) -> Self {
        let array = StringArray::from(values.to_vec());
        self.columns.push((name.to_string(), Arc::new(array)));
        self
    }

    /// Adds an Int64 column.
    #[must_use]
    pub fn int_column(mut self, name: &str, values: &[i64]) -> Self {
        let array = Int64Array::from(values.to_vec());
        self.columns.push((name.to_string(), Arc::new(array)));
        self
    }

    /// Adds a List<Utf8> column, one list per row.
    #[must_use]
    pub fn list_string_column(mut self, name: &str, values: &[&[&str]]) -> Self {
        let mut builder = ListBuilder::new(StringBuilder::new());
        for row in values {
            for value in *row {
                builder.values().append_value(value);
            }
            builder.append(true);
        }
        self.columns.push((name.to_string(), Arc::new(builder.finish())));
        self
    }

    /// Serializes the fixture to Parquet bytes.
    pub fn finish(self) -> Bytes {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|(name, array)| Field::new(name, array.data_type().clone(), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let arrays: Vec<ArrayRef> = self.columns.into_iter().map(|(_, array)| array).collect();
        let batch = RecordBatch::try_new(schema.clone(), arrays).expect("record batch build");

        let mut cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = ArrowWriter::try_new(&mut cursor, schema, None).expect("writer init");
        writer.write(&batch).expect("parquet write");
        writer.close().expect("parquet close");
        Bytes::from(cursor.into_inner())
    }
}

/// Builds a datastore payload with `row_count` rows under one project.
///
/// Rows carry a `path` under `/g/data/{project}/`, a `filename`, an
/// alternating `frequency` (daily/monthly), and a `variable`.
pub fn datastore_payload(row_count: usize, project: &str) -> Bytes {
    let paths: Vec<String> = (0..row_count)
        .map(|i| format!("/g/data/{project}/published/file_{i}.nc"))
        .collect();
    let filenames: Vec<String> = (0..row_count).map(|i| format!("file_{i}.nc")).collect();
    let frequencies: Vec<&str> = (0..row_count)
        .map(|i| if i % 2 == 0 { "daily" } else { "monthly" })
        .collect();
    let variables: Vec<&str> = (0..row_count)
        .map(|i| if i % 2 == 0 { "tas" } else { "pr" })
        .collect();

    TableFixture::new()
        .string_column(
            "path",
            &paths.iter().map(|p| Some(p.as_str())).collect::<Vec<_>>(),
        )
        .string_column(
            "filename",
            &filenames
                .iter()
                .map(|f| Some(f.as_str()))
                .collect::<Vec<_>>(),
        )
        .string_column(
            "frequency",
            &frequencies.iter().map(|f| Some(*f)).collect::<Vec<_>>(),
        )
        .string_column(
            "variable",
            &variables.iter().map(|v| Some(*v)).collect::<Vec<_>>(),
        )
        .finish()
}

/// Builds a one-row sidecar payload: one List<Utf8> field per column.
pub fn sidecar_payload(columns: &[(&str, &[&str])]) -> Bytes {
    let mut fixture = TableFixture::new();
    for (name, values) in columns {
        fixture = fixture.list_string_column(name, &[values]);
    }
    fixture.finish()
}

/// The sidecar matching [`datastore_payload`].
pub fn matching_sidecar(project: &str) -> Bytes {
    let path_root = format!("/g/data/{project}/published");
    sidecar_payload(&[
        ("path", &[path_root.as_str()]),
        ("frequency", &["daily", "monthly"]),
        ("variable", &["tas", "pr"]),
    ])
}
