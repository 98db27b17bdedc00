//! Filter selections, row predicates, and dynamic option narrowing.
//!
//! A selection is OR within a column and AND across columns; matching is a
//! case-insensitive substring test against the normalized cell. As the user
//! selects values in one dimension, the valid option sets of every *other*
//! dimension shrink to what still yields at least one row; while a dropdown
//! is open its recomputed options are buffered so the list does not reorder
//! under the cursor, and the buffer flushes on close.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use floe_core::value::{normalize_facet, normalize_field};

use crate::table::Row;

/// Per-column selected filter values.
///
/// A column absent from the map, or mapped to an empty list, imposes no
/// constraint.
pub type FilterSelection = BTreeMap<String, Vec<String>>;

/// Per-column option lists, in the order the filter UI presents them.
pub type FilterOptions = BTreeMap<String, Vec<String>>;

/// Returns true when the cell matches at least one selected value.
#[must_use]
pub fn cell_matches_any(cell: &Value, selected: &[String]) -> bool {
    let canonical = normalize_field(cell);
    selected.iter().any(|needle| canonical.matches(needle))
}

/// Returns true when the row satisfies every constrained column of the
/// selection.
#[must_use]
pub fn row_matches(row: &Row, selection: &FilterSelection) -> bool {
    row_matches_except(row, selection, None)
}

/// Row predicate that ignores one column's own selection.
///
/// This is the narrowing primitive: when computing the remaining options for
/// column C, C's own constraint must not apply.
#[must_use]
pub fn row_matches_except(row: &Row, selection: &FilterSelection, except: Option<&str>) -> bool {
    selection
        .iter()
        .filter(|(column, _)| except != Some(column.as_str()))
        .all(|(column, selected)| {
            if selected.is_empty() {
                return true;
            }
            let cell = row.get(column).unwrap_or(&Value::Null);
            cell_matches_any(cell, selected)
        })
}

/// Computes the still-reachable options for every column.
///
/// For each column C: filter the rows by every selection except C's own,
/// collect the distinct values present in C among the survivors (list cells
/// contribute each element), and restrict the static option list to that
/// set. The static order is preserved.
///
/// This is a full synchronous pass; the result is always consistent with the
/// selection that triggered it.
#[must_use]
pub fn compute_dynamic_options(
    rows: &[Row],
    filter_options: &FilterOptions,
    selection: &FilterSelection,
) -> FilterOptions {
    let mut out = FilterOptions::new();
    for (column, options) in filter_options {
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        for row in rows
            .iter()
            .filter(|row| row_matches_except(row, selection, Some(column)))
        {
            let cell = row.get(column).unwrap_or(&Value::Null);
            reachable.extend(normalize_facet(cell));
        }
        out.insert(
            column.clone(),
            options
                .iter()
                .filter(|option| reachable.contains(*option))
                .cloned()
                .collect(),
        );
    }
    out
}

/// Live/pending option state driven by the dropdown UI.
///
/// Recomputed options for an open column are held in a pending buffer
/// instead of being applied to the live state; the most recent pending value
/// is applied when the column's dropdown closes. Columns whose dropdown is
/// closed always receive updates immediately.
#[derive(Debug, Default)]
pub struct DynamicFilterState {
    open_columns: BTreeSet<String>,
    pending: BTreeMap<String, Vec<String>>,
    live: FilterOptions,
}

impl DynamicFilterState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The options currently exposed to the UI.
    #[must_use]
    pub fn live_options(&self) -> &FilterOptions {
        &self.live
    }

    /// The buffered update for a column, if one is pending.
    #[must_use]
    pub fn pending_update(&self, column: &str) -> Option<&Vec<String>> {
        self.pending.get(column)
    }

    /// Returns true when the column's dropdown is open.
    #[must_use]
    pub fn is_open(&self, column: &str) -> bool {
        self.open_columns.contains(column)
    }

    /// Marks a column's dropdown as open; its updates buffer from now on.
    pub fn on_dropdown_open(&mut self, column: &str) {
        self.open_columns.insert(column.to_string());
    }

    /// Applies a recompute result: open columns buffer, closed columns go
    /// live immediately.
    pub fn on_recompute(&mut self, new_options: FilterOptions) {
        for (column, options) in new_options {
            if self.open_columns.contains(&column) {
                self.pending.insert(column, options);
            } else {
                self.live.insert(column, options);
            }
        }
    }

    /// Marks a column's dropdown as closed and flushes its pending update,
    /// if any.
    pub fn on_dropdown_close(&mut self, column: &str) {
        self.open_columns.remove(column);
        if let Some(options) = self.pending.remove(column) {
            self.live.insert(column.to_string(), options);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row(&[("project", json!("p1")), ("experiment", json!("e1"))]),
            row(&[("project", json!("p2")), ("experiment", json!("e2"))]),
            row(&[("project", json!("p1")), ("experiment", json!("e3"))]),
        ]
    }

    fn sample_options() -> FilterOptions {
        let mut options = FilterOptions::new();
        options.insert(
            "project".to_string(),
            vec!["p1".to_string(), "p2".to_string()],
        );
        options.insert(
            "experiment".to_string(),
            vec!["e1".to_string(), "e2".to_string(), "e3".to_string()],
        );
        options
    }

    #[test]
    fn test_row_matches_or_within_column() {
        let mut selection = FilterSelection::new();
        selection.insert(
            "project".to_string(),
            vec!["p1".to_string(), "p2".to_string()],
        );

        let rows = sample_rows();
        assert!(row_matches(&rows[0], &selection));
        assert!(row_matches(&rows[1], &selection));
    }

    #[test]
    fn test_row_matches_and_across_columns() {
        let mut selection = FilterSelection::new();
        selection.insert("project".to_string(), vec!["p1".to_string()]);
        selection.insert("experiment".to_string(), vec!["e3".to_string()]);

        let rows = sample_rows();
        assert!(!row_matches(&rows[0], &selection));
        assert!(row_matches(&rows[2], &selection));
    }

    #[test]
    fn test_empty_selection_is_unconstrained() {
        let mut selection = FilterSelection::new();
        selection.insert("project".to_string(), Vec::new());

        for row in &sample_rows() {
            assert!(row_matches(row, &selection));
        }
    }

    #[test]
    fn test_missing_column_never_matches_constraint() {
        let mut selection = FilterSelection::new();
        selection.insert("nonexistent".to_string(), vec!["x".to_string()]);

        assert!(!row_matches(&sample_rows()[0], &selection));
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let rows = vec![row(&[("model", json!("ACCESS-ESM1-5"))])];
        let mut selection = FilterSelection::new();
        selection.insert("model".to_string(), vec!["esm1".to_string()]);
        assert!(row_matches(&rows[0], &selection));
    }

    #[test]
    fn test_narrowing_spec_example() {
        // Selecting p1 narrows experiment to the rows that still match,
        // preserving static option order.
        let mut selection = FilterSelection::new();
        selection.insert("project".to_string(), vec!["p1".to_string()]);

        let dynamic = compute_dynamic_options(&sample_rows(), &sample_options(), &selection);
        assert_eq!(
            dynamic.get("experiment"),
            Some(&vec!["e1".to_string(), "e3".to_string()])
        );
    }

    #[test]
    fn test_narrowing_ignores_own_column_selection() {
        // The project options stay complete even though p1 is selected:
        // a column's own constraint does not narrow itself.
        let mut selection = FilterSelection::new();
        selection.insert("project".to_string(), vec!["p1".to_string()]);

        let dynamic = compute_dynamic_options(&sample_rows(), &sample_options(), &selection);
        assert_eq!(
            dynamic.get("project"),
            Some(&vec!["p1".to_string(), "p2".to_string()])
        );
    }

    #[test]
    fn test_narrowing_list_cells_contribute_each_element() {
        let rows = vec![
            row(&[
                ("variable", json!(["tas", "pr"])),
                ("realm", json!("atmos")),
            ]),
            row(&[("variable", json!(["so"])), ("realm", json!("ocean"))]),
        ];
        let mut options = FilterOptions::new();
        options.insert(
            "variable".to_string(),
            vec!["pr".to_string(), "so".to_string(), "tas".to_string()],
        );
        options.insert(
            "realm".to_string(),
            vec!["atmos".to_string(), "ocean".to_string()],
        );

        let mut selection = FilterSelection::new();
        selection.insert("realm".to_string(), vec!["atmos".to_string()]);

        let dynamic = compute_dynamic_options(&rows, &options, &selection);
        assert_eq!(
            dynamic.get("variable"),
            Some(&vec!["pr".to_string(), "tas".to_string()])
        );
    }

    #[test]
    fn test_buffering_open_column_defers_update() {
        let mut state = DynamicFilterState::new();
        state.on_recompute(sample_options());
        assert_eq!(state.live_options(), &sample_options());

        state.on_dropdown_open("experiment");

        let mut narrowed = sample_options();
        narrowed.insert(
            "experiment".to_string(),
            vec!["e1".to_string(), "e3".to_string()],
        );
        state.on_recompute(narrowed);

        // Live stays stable under the open dropdown; the update is pending.
        assert_eq!(
            state.live_options().get("experiment"),
            Some(&vec!["e1".to_string(), "e2".to_string(), "e3".to_string()])
        );
        assert_eq!(
            state.pending_update("experiment"),
            Some(&vec!["e1".to_string(), "e3".to_string()])
        );

        state.on_dropdown_close("experiment");
        assert_eq!(
            state.live_options().get("experiment"),
            Some(&vec!["e1".to_string(), "e3".to_string()])
        );
        assert_eq!(state.pending_update("experiment"), None);
    }

    #[test]
    fn test_buffering_latest_pending_wins() {
        let mut state = DynamicFilterState::new();
        state.on_dropdown_open("experiment");

        let mut first = FilterOptions::new();
        first.insert("experiment".to_string(), vec!["e1".to_string()]);
        state.on_recompute(first);

        let mut second = FilterOptions::new();
        second.insert("experiment".to_string(), vec!["e2".to_string()]);
        state.on_recompute(second);

        state.on_dropdown_close("experiment");
        assert_eq!(
            state.live_options().get("experiment"),
            Some(&vec!["e2".to_string()])
        );
    }

    #[test]
    fn test_buffering_close_without_pending_changes_nothing() {
        let mut state = DynamicFilterState::new();
        state.on_recompute(sample_options());
        state.on_dropdown_open("project");
        state.on_dropdown_close("project");

        assert_eq!(state.live_options(), &sample_options());
    }

    #[test]
    fn test_buffering_columns_buffer_independently() {
        let mut state = DynamicFilterState::new();
        state.on_dropdown_open("project");

        let mut update = FilterOptions::new();
        update.insert("project".to_string(), vec!["p1".to_string()]);
        update.insert("experiment".to_string(), vec!["e1".to_string()]);
        state.on_recompute(update);

        // Open column buffered, closed column applied immediately.
        assert_eq!(state.live_options().get("project"), None);
        assert_eq!(
            state.live_options().get("experiment"),
            Some(&vec!["e1".to_string()])
        );
        assert!(state.is_open("project"));
        assert!(state.pending_update("project").is_some());
    }
}
