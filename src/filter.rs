/// Per-column filters
///
/// Each filterable column carries a free-text search and a set of included
/// values (the checked boxes of a column filter popup). A row survives when,
/// for every column with state:
///
/// - the search text is empty or occurs in the row's value, ignoring case
/// - the included set contains the row's value
///
/// Filters combine with AND. Two rules are easy to miss:
///
/// - An included set that is *empty* (everything unchecked) empties the
///   whole result, whatever the other columns say.
/// - A row whose value is empty is never in the included set (blank values
///   are not offered as options), so it only survives while the set still
///   covers every distinct value of the column, i.e. while nothing is
///   unchecked. A whitespace-only value is not an option either but does
///   not count as empty, so it never passes a membership filter.
///
/// State objects are plain values. Transitions take `self` and return the
/// new state; nothing here holds onto rows.
///
/// # Examples
///
/// ```
/// use program_report::{ColumnFilters, DerivedRow, ReportRow};
/// # use program_report::{aggregate_values, AggregationConfig, UserDirectory};
/// # use serde_json::json;
/// # let rows = aggregate_values(&[
/// #     json!({"id": "1", "overview": {"category": "강좌", "title": "수채화"}}),
/// #     json!({"id": "2", "overview": {"category": "행사", "title": "북콘서트"}}),
/// # ], &UserDirectory::new(), &AggregationConfig::default()).unwrap();
///
/// let filters = ColumnFilters::initialize(&rows, &["category", "title"]);
/// assert_eq!(filters.apply(&rows).len(), 2);
///
/// let filters = filters.toggle_value(&rows, "category", "행사", false);
/// let visible = filters.apply(&rows);
/// assert_eq!(visible.len(), 1);
/// assert_eq!(visible[0].row_id(), "1");
/// ```

use crate::columns::INDEX_COLUMN;
use crate::row::ReportRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Filter state of one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilterState {
    pub search: String,
    /// `None` until initialised; an uninitialised set does not filter.
    pub included: Option<BTreeSet<String>>,
}

impl ColumnFilterState {
    pub fn all_of(values: BTreeSet<String>) -> Self {
        ColumnFilterState {
            search: String::new(),
            included: Some(values),
        }
    }
}

/// Filter state for every column of a screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnFilters {
    columns: BTreeMap<String, ColumnFilterState>,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Distinct non-blank values of a column, sorted by plain string order.
pub fn distinct_values<R: ReportRow>(rows: &[R], column: &str) -> BTreeSet<String> {
    rows.iter()
        .map(|row| row.cell(column).to_filter_string())
        .filter(|value| !is_blank(value))
        .collect()
}

impl ColumnFilters {
    /// No filter state at all; every row passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh state for a (re)loaded universe: empty searches and every
    /// distinct value included. The index column is skipped.
    pub fn initialize<R: ReportRow>(rows: &[R], columns: &[&str]) -> Self {
        let columns = columns
            .iter()
            .filter(|column| **column != INDEX_COLUMN)
            .map(|column| {
                (
                    column.to_string(),
                    ColumnFilterState::all_of(distinct_values(rows, column)),
                )
            })
            .collect();
        ColumnFilters { columns }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilterState> {
        self.columns.get(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnFilterState)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep the rows that satisfy every column's filter.
    ///
    /// `rows` is the full universe: the blank-value rule compares each
    /// included set against the distinct values of these rows.
    pub fn apply<R: ReportRow>(&self, rows: &[R]) -> Vec<R> {
        let mut keep = vec![true; rows.len()];

        for (column, state) in &self.columns {
            if matches!(&state.included, Some(set) if set.is_empty()) {
                return Vec::new();
            }

            let values: Vec<String> = rows
                .iter()
                .map(|row| row.cell(column).to_filter_string())
                .collect();

            if !state.search.is_empty() {
                let needle = state.search.to_lowercase();
                for (flag, value) in keep.iter_mut().zip(&values) {
                    if *flag && !value.to_lowercase().contains(&needle) {
                        *flag = false;
                    }
                }
            }

            if let Some(included) = &state.included {
                let covers_universe = distinct_values(rows, column).is_subset(included);
                for (flag, value) in keep.iter_mut().zip(&values) {
                    if *flag && !included.contains(value) && !(value.is_empty() && covers_universe) {
                        *flag = false;
                    }
                }
            }
        }

        rows.iter()
            .zip(keep)
            .filter(|(_, kept)| *kept)
            .map(|(row, _)| row.clone())
            .collect()
    }

    /// True when the column's state would hide something: a search is set
    /// or some distinct value is unchecked.
    pub fn is_narrowing<R: ReportRow>(&self, rows: &[R], column: &str) -> bool {
        match self.columns.get(column) {
            None => false,
            Some(state) => {
                !state.search.is_empty()
                    || state
                        .included
                        .as_ref()
                        .map(|set| !distinct_values(rows, column).is_subset(set))
                        .unwrap_or(false)
            }
        }
    }

    pub fn set_search(mut self, column: &str, text: &str) -> Self {
        self.columns.entry(column.to_string()).or_default().search = text.to_string();
        self
    }

    /// Check or uncheck one value. A column without an initialised set is
    /// seeded with all distinct values of `rows` first.
    pub fn toggle_value<R: ReportRow>(mut self, rows: &[R], column: &str, value: &str, included: bool) -> Self {
        let state = self.columns.entry(column.to_string()).or_default();
        let set = state
            .included
            .get_or_insert_with(|| distinct_values(rows, column));
        if included {
            set.insert(value.to_string());
        } else {
            set.remove(value);
        }
        self
    }

    /// Check all of `all_values`, or uncheck everything.
    pub fn set_all<I, S>(mut self, column: &str, included: bool, all_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = if included {
            all_values.into_iter().map(Into::into).collect()
        } else {
            BTreeSet::new()
        };
        self.columns.entry(column.to_string()).or_default().included = Some(set);
        self
    }
}
