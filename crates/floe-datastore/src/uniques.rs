//! Unique-value index builder.
//!
//! Each datastore ships a sidecar payload holding exactly one aggregated
//! row: one field per filterable column, each a list of the distinct values
//! appearing in that column. This module turns that row into the per-column
//! option lists that populate the filter dropdowns.
//!
//! Losing filter options must never fail a datastore load, so every failure
//! mode here degrades to an empty result with a warning.

use floe_core::value::normalize_facet;

use crate::filters::FilterOptions;
use crate::table::Row;

/// Columns describing file locations rather than filterable metadata.
pub const STRUCTURAL_COLUMNS: &[&str] = &["path", "filename"];

/// Builds the per-column filter option index from the scanned sidecar rows.
///
/// Expects exactly one row; any other shape yields an empty index and a
/// warning. Per column: values are extracted with the usual normalization
/// rules, blank entries (after trimming) are dropped, duplicates are
/// collapsed, and the result is sorted byte-wise. A null column still
/// contributes an entry with an empty option list.
#[must_use]
pub fn build_filter_options(sidecar_rows: &[Row]) -> FilterOptions {
    let [row] = sidecar_rows else {
        tracing::warn!(
            rows = sidecar_rows.len(),
            "sidecar payload should hold exactly one aggregated row; filters will have no options"
        );
        return FilterOptions::new();
    };

    let mut options = FilterOptions::new();
    for (column, value) in row {
        if STRUCTURAL_COLUMNS.contains(&column.as_str()) {
            continue;
        }
        let distinct: std::collections::BTreeSet<String> = normalize_facet(value)
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();
        options.insert(column.clone(), distinct.into_iter().collect());
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sidecar_row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_structural_columns_excluded_and_blanks_dropped() {
        let rows = vec![sidecar_row(&[
            ("path", json!(["/g/data/x/a.nc"])),
            ("frequency", json!(["daily", "daily", ""])),
        ])];

        let options = build_filter_options(&rows);
        assert_eq!(options.len(), 1);
        assert_eq!(options.get("frequency"), Some(&vec!["daily".to_string()]));
    }

    #[test]
    fn test_filename_excluded() {
        let rows = vec![sidecar_row(&[
            ("filename", json!(["a.nc", "b.nc"])),
            ("realm", json!(["ocean"])),
        ])];

        let options = build_filter_options(&rows);
        assert!(!options.contains_key("filename"));
        assert_eq!(options.get("realm"), Some(&vec!["ocean".to_string()]));
    }

    #[test]
    fn test_options_sorted_ordinally() {
        let rows = vec![sidecar_row(&[(
            "variable",
            json!(["tas", "Pr", "huss"]),
        )])];

        let options = build_filter_options(&rows);
        // Byte-wise sort: uppercase before lowercase.
        assert_eq!(
            options.get("variable"),
            Some(&vec![
                "Pr".to_string(),
                "huss".to_string(),
                "tas".to_string()
            ])
        );
    }

    #[test]
    fn test_null_column_yields_empty_list_not_absence() {
        let rows = vec![sidecar_row(&[("frequency", Value::Null)])];

        let options = build_filter_options(&rows);
        assert_eq!(options.get("frequency"), Some(&Vec::new()));
    }

    #[test]
    fn test_zero_rows_yields_empty_index() {
        assert!(build_filter_options(&[]).is_empty());
    }

    #[test]
    fn test_multiple_rows_yields_empty_index() {
        let rows = vec![
            sidecar_row(&[("frequency", json!(["daily"]))]),
            sidecar_row(&[("frequency", json!(["monthly"]))]),
        ];
        assert!(build_filter_options(&rows).is_empty());
    }

    #[test]
    fn test_whitespace_only_entries_dropped() {
        let rows = vec![sidecar_row(&[("realm", json!(["ocean", "  ", "\t"]))])];
        let options = build_filter_options(&rows);
        assert_eq!(options.get("realm"), Some(&vec!["ocean".to_string()]));
    }
}
