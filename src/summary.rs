/// Totals row
///
/// Sums every summed column of a layout over the visible rows and counts the
/// rows for columns that show "N items" instead of a sum. Totals are always
/// recomputed from the rows given; nothing is cached between calls.

use crate::columns::{ReportLayout, TotalKind};
use crate::row::ReportRow;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Totals of one view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub sums: BTreeMap<String, i64>,
    pub row_count: usize,
}

impl Totals {
    /// Sum of a summed column, `None` for columns that are not summed.
    pub fn get(&self, column: &str) -> Option<i64> {
        self.sums.get(column).copied()
    }

    pub fn is_zero(&self) -> bool {
        self.sums.values().all(|v| *v == 0)
    }

    /// Totals row keyed like the layout's columns: sums for summed columns,
    /// the row count for row-count columns. Other columns are omitted.
    pub fn to_json(&self, layout: &ReportLayout) -> JsonValue {
        let mut obj = Map::new();
        for column in &layout.columns {
            let value = match column.total {
                TotalKind::Sum => JsonValue::from(self.get(&column.key).unwrap_or(0)),
                TotalKind::RowCount => JsonValue::from(self.row_count),
                TotalKind::None => continue,
            };
            obj.insert(column.key.clone(), value);
        }
        JsonValue::Object(obj)
    }
}

/// Sum each column over `rows`. Missing or non-numeric cells count as zero.
pub fn sum_columns<R: ReportRow>(rows: &[R], columns: &[&str]) -> BTreeMap<String, i64> {
    columns
        .iter()
        .map(|column| {
            let total = rows
                .iter()
                .fold(0i64, |acc, row| acc.saturating_add(row.cell(column).to_amount()));
            (column.to_string(), total)
        })
        .collect()
}

/// Totals for a layout over the visible rows.
pub fn summarize<R: ReportRow>(rows: &[R], layout: &ReportLayout) -> Totals {
    Totals {
        sums: sum_columns(rows, &layout.summed_columns()),
        row_count: rows.len(),
    }
}
