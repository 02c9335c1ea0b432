/// Column layouts for report screens
///
/// A `ReportLayout` describes one table screen: its columns in display
/// order, which of them can be filtered or sorted, how each one totals, and
/// the default ordering used when no sort column is chosen. Layouts are
/// plain data and can be loaded from JSON, so a new screen does not need
/// new code.
///
/// # Examples
///
/// ```
/// use program_report::{ReportLayout, TotalKind};
///
/// let layout = ReportLayout::status();
/// assert_eq!(layout.column("grandTotal").unwrap().total, TotalKind::Sum);
/// assert_eq!(layout.column("title").unwrap().total, TotalKind::RowCount);
/// assert!(!layout.filter_columns().contains(&"index"));
/// ```

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Key of the synthetic 1-based display index column.
pub const INDEX_COLUMN: &str = "index";

/// Value type of a column, used by presentation for alignment and number
/// formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    Number,
}

/// How a column contributes to the totals row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalKind {
    #[default]
    None,
    /// Arithmetic sum of the column's numeric values
    Sum,
    /// Number of visible rows ("N items")
    RowCount,
}

/// Comparator used when the user sorts by this column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortRule {
    /// Numbers numerically, everything else by collated text
    #[default]
    Natural,
    /// Collated label, ties broken by the layout tie-break column ascending
    LabelThenTieBreak,
    /// Position in the externally supplied rank table
    Ranked,
}

fn yes() -> bool {
    true
}

/// One column of a report screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub total: TotalKind,
    #[serde(default = "yes")]
    pub filterable: bool,
    #[serde(default = "yes")]
    pub sortable: bool,
    #[serde(default)]
    pub sort_rule: SortRule,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        ColumnDef {
            key: key.into(),
            label: label.into(),
            kind: ColumnKind::Text,
            total: TotalKind::None,
            filterable: true,
            sortable: true,
            sort_rule: SortRule::Natural,
        }
    }

    pub fn number(mut self) -> Self {
        self.kind = ColumnKind::Number;
        self
    }

    /// Numeric column that is summed in the totals row.
    pub fn summed(mut self) -> Self {
        self.kind = ColumnKind::Number;
        self.total = TotalKind::Sum;
        self
    }

    pub fn row_count(mut self) -> Self {
        self.total = TotalKind::RowCount;
        self
    }

    pub fn sort_rule(mut self, rule: SortRule) -> Self {
        self.sort_rule = rule;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.filterable = false;
        self.sortable = false;
        self
    }
}

/// Ordering applied when no sort column is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultOrder {
    /// Column looked up in the rank table
    pub rank_column: String,
    /// Column compared (ascending, collated) when ranks tie
    pub tie_break: String,
    /// Compare rank-column labels when both rows are unranked
    #[serde(default)]
    pub collate_unranked: bool,
}

/// Column layout of one report screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLayout {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub default_order: DefaultOrder,
}

impl ReportLayout {
    /// The program status screen: one row per program with attendance and
    /// budget subtotals.
    pub fn status() -> Self {
        fn text(key: &str, label: &str) -> ColumnDef {
            ColumnDef::new(key, label)
        }
        ReportLayout {
            name: "status".to_string(),
            columns: vec![
                ColumnDef::new(INDEX_COLUMN, "연번").number().fixed(),
                text("category", "구분").sort_rule(SortRule::LabelThenTieBreak),
                text("title", "제목").row_count(),
                text("instructor", "강사"),
                text("count", "횟수").summed(),
                text("weekType", "평일/주말"),
                text("startDate", "시작일"),
                text("endDate", "종료일"),
                text("startTime", "시작시간"),
                text("endTime", "종료시간"),
                text("inOut", "관내/관외"),
                text("place", "장소"),
                text("connection", "연계"),
                text("target", "대상"),
                text("method", "방법"),
                text("amt21001", "210-01").summed(),
                text("amt21006", "210-06").summed(),
                text("amt31006", "310-06").summed(),
                text("adultMale", "성인(남)").summed(),
                text("adultFemale", "성인(여)").summed(),
                text("adultTotal", "성인(계)").summed(),
                text("teenMale", "중고생(남)").summed(),
                text("teenFemale", "중고생(여)").summed(),
                text("teenTotal", "중고생(계)").summed(),
                text("childMale", "어린이(남)").summed(),
                text("childFemale", "어린이(여)").summed(),
                text("childTotal", "어린이(계)").summed(),
                text("maleTotal", "남자(계)").summed(),
                text("femaleTotal", "여자(계)").summed(),
                text("grandTotal", "합계").summed(),
                text("assigneeName", "작업자"),
                text("updatedAt", "작업일시"),
            ],
            default_order: DefaultOrder {
                rank_column: "category".to_string(),
                tie_break: "title".to_string(),
                collate_unranked: false,
            },
        }
    }

    /// The user management screen.
    pub fn users() -> Self {
        ReportLayout {
            name: "users".to_string(),
            columns: vec![
                ColumnDef::new("libraryName", "도서관").sort_rule(SortRule::Ranked),
                ColumnDef::new("name", "이름"),
                ColumnDef::new("status", "상태"),
                ColumnDef::new("role", "권한"),
                ColumnDef::new("createdAt", "가입일시"),
            ],
            default_order: DefaultOrder {
                rank_column: "libraryName".to_string(),
                tie_break: "name".to_string(),
                collate_unranked: true,
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let layout: ReportLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Reject duplicate keys and a default order naming unknown columns.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.key.as_str()) {
                return Err(ReportError::Config(format!(
                    "duplicate column '{}' in layout '{}'",
                    column.key, self.name
                )));
            }
        }
        for key in [&self.default_order.rank_column, &self.default_order.tie_break] {
            if self.column(key).is_none() {
                return Err(ReportError::UnknownColumn(key.clone()));
            }
        }
        Ok(())
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }

    /// Columns that get filter state. The index column never does.
    pub fn filter_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.filterable && c.key != INDEX_COLUMN)
            .map(|c| c.key.as_str())
            .collect()
    }

    pub fn summed_columns(&self) -> Vec<&str> {
        self.columns_with_total(TotalKind::Sum)
    }

    pub fn row_count_columns(&self) -> Vec<&str> {
        self.columns_with_total(TotalKind::RowCount)
    }

    fn columns_with_total(&self, kind: TotalKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.total == kind)
            .map(|c| c.key.as_str())
            .collect()
    }

    /// Sort rule for a column, `None` when it is not sortable.
    pub fn sort_rule(&self, key: &str) -> Option<SortRule> {
        self.column(key)
            .filter(|c| c.sortable && c.key != INDEX_COLUMN)
            .map(|c| c.sort_rule)
    }
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::status()
    }
}
