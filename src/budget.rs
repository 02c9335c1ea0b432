/// Budget execution summary
///
/// Budget lines come from the budget master list: objects `{v1..v5, v6}`
/// where `v1..v5` is the line's path (three levels of business item, the
/// expense item and the classification code) and `v6` the allocated
/// amount. Every budget item of every record whose path matches a line adds
/// to that line's spent amount and leaves a detail entry naming the record.

use crate::collate::compare;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::order::{SortDirection, SortState};
use crate::record::RawRecord;
use crate::source::RecordSource;
use crate::value::{json_amount, json_scalar_text};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

/// Title used for details whose record has none.
pub const UNTITLED: &str = "제목 없음";

/// One record's contribution to a budget line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetDetail {
    pub title: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetLine {
    pub path: [String; 5],
    pub allocated: i64,
    pub spent: i64,
    pub details: Vec<BudgetDetail>,
}

impl BudgetLine {
    /// Parse a master list entry. Entries that are not objects with a
    /// non-empty `v1` are not budget lines.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let obj = value.as_object()?;
        let part = |key: &str| obj.get(key).map(json_scalar_text).unwrap_or_default();
        let major = part("v1");
        if major.is_empty() {
            return None;
        }
        Some(BudgetLine {
            path: [major, part("v2"), part("v3"), part("v4"), part("v5")],
            allocated: obj.get("v6").map(json_amount).unwrap_or(0),
            spent: 0,
            details: Vec::new(),
        })
    }

    pub fn balance(&self) -> i64 {
        self.allocated.saturating_sub(self.spent)
    }

    pub fn label(&self) -> String {
        self.path.join(" > ")
    }

    /// Details sorted by `amount` (numerically) or `title` (collated).
    /// Without both a key and a direction the stored order is kept.
    pub fn sorted_details(&self, sort: &SortState) -> Vec<BudgetDetail> {
        let mut details = self.details.clone();
        let (Some(key), Some(direction)) = (sort.key.as_deref(), sort.direction) else {
            return details;
        };
        if key != "amount" && key != "title" {
            return details;
        }
        let ascending = |a: &BudgetDetail, b: &BudgetDetail| match key {
            "amount" => a.amount.cmp(&b.amount),
            _ => compare(&a.title, &b.title),
        };
        details.sort_by(|a, b| match direction {
            SortDirection::Asc => ascending(a, b),
            SortDirection::Desc => ascending(b, a),
        });
        details
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "path": self.path,
            "allocated": self.allocated,
            "spent": self.spent,
            "balance": self.balance(),
            "details": self.details,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BudgetTotals {
    pub allocated: i64,
    pub spent: i64,
    pub balance: i64,
}

/// Budget lines in master-list order with their execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetSummary {
    pub lines: Vec<BudgetLine>,
}

impl BudgetSummary {
    /// Match every record's budget items against the master list. A path
    /// listed twice keeps its first line.
    pub fn build(master_list: &[JsonValue], records: &[RawRecord]) -> Self {
        let mut lines: Vec<BudgetLine> = Vec::new();
        let mut by_path: HashMap<[String; 5], usize> = HashMap::new();
        for line in master_list.iter().filter_map(BudgetLine::from_json) {
            if !by_path.contains_key(&line.path) {
                by_path.insert(line.path.clone(), lines.len());
                lines.push(line);
            }
        }

        for record in records {
            let title = record.overview_text("title");
            let title = if title.is_empty() { UNTITLED.to_string() } else { title };
            for item in &record.budget_items {
                let [v1, v2, v3, v4] = item.path.clone();
                let path = [v1, v2, v3, v4, item.classification_code.clone()];
                if let Some(&position) = by_path.get(&path) {
                    let line = &mut lines[position];
                    line.spent = line.spent.saturating_add(item.amount);
                    line.details.push(BudgetDetail {
                        title: title.clone(),
                        amount: item.amount,
                    });
                }
            }
        }

        BudgetSummary { lines }
    }

    pub fn totals(&self) -> BudgetTotals {
        let allocated = self.lines.iter().fold(0i64, |acc, l| acc.saturating_add(l.allocated));
        let spent = self.lines.iter().fold(0i64, |acc, l| acc.saturating_add(l.spent));
        BudgetTotals {
            allocated,
            spent,
            balance: allocated.saturating_sub(spent),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let lines: Vec<JsonValue> = self.lines.iter().map(BudgetLine::to_json).collect();
        json!({
            "lines": lines,
            "totals": self.totals(),
        })
    }
}

/// Fetch the budget master list and records for `config`'s scope.
pub fn load_budget_summary<S>(source: &S, config: &ReportConfig) -> Result<BudgetSummary>
where
    S: RecordSource + ?Sized,
{
    let scope = config.scope();
    let master_list = source.fetch_master_list(&scope, &config.budget_list_key)?;
    let records = source.fetch_records(&scope)?;
    Ok(BudgetSummary::build(&master_list, &records))
}
