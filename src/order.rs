/// Row ordering
///
/// The orderer sorts a filtered row set, applies the optional year filter and
/// numbers the survivors `1..=N` as their display index.
///
/// With a sort column selected, rows compare by that column according to
/// the column's [`SortRule`]. Without one, rows follow the layout's default
/// order: the rank of the rank column in an externally supplied
/// [`RankTable`] (a miss ranks last), then the tie-break column ascending.
/// Pinned rows always come first.
///
/// Sort keys are computed once per row and the sort is stable, so rows that
/// compare equal keep their input order.
///
/// # Examples
///
/// ```
/// use program_report::{Orderer, RankTable, ReportLayout, SortState, ReportRow};
/// # use program_report::{aggregate_values, AggregationConfig, UserDirectory};
/// # use serde_json::json;
/// # let rows = aggregate_values(&[
/// #     json!({"id": "1", "overview": {"category": "행사", "title": "가"}}),
/// #     json!({"id": "2", "overview": {"category": "강좌", "title": "나"}}),
/// #     json!({"id": "3", "overview": {"category": "강좌", "title": "가"}}),
/// # ], &UserDirectory::new(), &AggregationConfig::default()).unwrap();
///
/// let layout = ReportLayout::status();
/// let ranks = RankTable::from_labels(["강좌", "행사"]);
/// let ordered = Orderer::new(&layout).order(rows, &SortState::none(), &ranks, None);
///
/// let ids: Vec<&str> = ordered.iter().map(|r| r.row_id()).collect();
/// assert_eq!(ids, vec!["3", "2", "1"]);
/// assert_eq!(ordered[2].display_index(), Some(3));
/// ```

use crate::collate::CollationKey;
use crate::columns::{ReportLayout, SortRule};
use crate::row::ReportRow;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Column matched against the year filter.
pub const YEAR_COLUMN: &str = "startDate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Selected sort column. Both fields unset means the default order; a key
/// without a direction sorts ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn asc(key: impl Into<String>) -> Self {
        SortState {
            key: Some(key.into()),
            direction: Some(SortDirection::Asc),
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        SortState {
            key: Some(key.into()),
            direction: Some(SortDirection::Desc),
        }
    }

    /// Header click: the same column ascending flips to descending,
    /// anything else starts ascending.
    pub fn toggled(&self, key: &str) -> Self {
        match (self.key.as_deref(), self.direction) {
            (Some(current), Some(SortDirection::Asc)) | (Some(current), None) if current == key => {
                Self::desc(key)
            }
            _ => Self::asc(key),
        }
    }

    fn is_descending(&self) -> bool {
        self.direction == Some(SortDirection::Desc)
    }
}

/// Position of each label in an ordered master list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankTable {
    ranks: HashMap<String, usize>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank labels by list position. A repeated label keeps its first rank.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranks = HashMap::new();
        for (position, label) in labels.into_iter().enumerate() {
            ranks.entry(label.as_ref().to_string()).or_insert(position);
        }
        RankTable { ranks }
    }

    pub fn rank(&self, label: &str) -> Option<usize> {
        self.ranks.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

/// Comparable form of a cell. Numbers sort before text.
#[derive(Debug, Clone)]
enum SortValue {
    Number(f64),
    Text(CollationKey),
}

impl SortValue {
    fn of(value: &CellValue) -> Self {
        match value.as_number() {
            Some(n) => SortValue::Number(n),
            None => SortValue::Text(CollationKey::new(&value.to_filter_string())),
        }
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortValue {}

/// Ranked labels first by rank, then unranked ones, optionally by label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    unranked: bool,
    rank: usize,
    label: Option<CollationKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Primary {
    Value(SortValue),
    Rank(RankKey),
}

#[derive(Debug)]
struct RowKey {
    pinned: bool,
    primary: Primary,
    tie_break: Option<CollationKey>,
}

/// Sorts rows for one layout.
#[derive(Debug, Clone, Copy)]
pub struct Orderer<'a> {
    layout: &'a ReportLayout,
}

impl<'a> Orderer<'a> {
    pub fn new(layout: &'a ReportLayout) -> Self {
        Orderer { layout }
    }

    /// Sort, drop rows outside `year` and assign display indices.
    ///
    /// The year filter keeps rows whose start date text contains `year`.
    /// Sorting by the index column or a column the layout does not know
    /// falls back to the default order.
    pub fn order<R: ReportRow>(
        &self,
        rows: Vec<R>,
        sort: &SortState,
        ranks: &RankTable,
        year: Option<&str>,
    ) -> Vec<R> {
        let rule = sort
            .key
            .as_deref()
            .and_then(|key| self.layout.sort_rule(key).map(|rule| (key, rule)));
        let descending = rule.is_some() && sort.is_descending();

        let keys: Vec<RowKey> = rows
            .iter()
            .map(|row| self.row_key(row, rule, ranks))
            .collect();

        let mut positions: Vec<usize> = (0..rows.len()).collect();
        positions.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b], descending));

        let mut slots: Vec<Option<R>> = rows.into_iter().map(Some).collect();
        let mut ordered: Vec<R> = positions
            .into_iter()
            .filter_map(|position| slots[position].take())
            .collect();

        if let Some(year) = year.map(str::trim).filter(|y| !y.is_empty()) {
            ordered.retain(|row| {
                row.cell(YEAR_COLUMN)
                    .to_filter_string()
                    .trim()
                    .contains(year)
            });
        }

        for (position, row) in ordered.iter_mut().enumerate() {
            row.set_display_index(position + 1);
        }
        ordered
    }

    fn row_key<R: ReportRow>(&self, row: &R, rule: Option<(&str, SortRule)>, ranks: &RankTable) -> RowKey {
        let tie_break_column = &self.layout.default_order.tie_break;
        let tie_break_key = || Some(CollationKey::new(&row.cell(tie_break_column).to_filter_string()));

        let (primary, tie_break) = match rule {
            Some((key, SortRule::Natural)) => (Primary::Value(SortValue::of(&row.cell(key))), None),
            Some((key, SortRule::LabelThenTieBreak)) => {
                let label = row.cell(key).to_filter_string();
                (Primary::Value(SortValue::Text(CollationKey::new(&label))), tie_break_key())
            }
            Some((key, SortRule::Ranked)) => (Primary::Rank(rank_key(&row.cell(key), ranks, true)), None),
            None => {
                let order = &self.layout.default_order;
                let value = row.cell(&order.rank_column);
                (
                    Primary::Rank(rank_key(&value, ranks, order.collate_unranked)),
                    tie_break_key(),
                )
            }
        };

        RowKey {
            pinned: row.pinned(),
            primary,
            tie_break,
        }
    }
}

fn rank_key(value: &CellValue, ranks: &RankTable, collate_unranked: bool) -> RankKey {
    let label = value.to_filter_string();
    match ranks.rank(&label) {
        Some(rank) => RankKey {
            unranked: false,
            rank,
            label: None,
        },
        None => RankKey {
            unranked: true,
            rank: 0,
            label: collate_unranked.then(|| CollationKey::new(&label)),
        },
    }
}

fn compare_keys(a: &RowKey, b: &RowKey, descending: bool) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| {
            let primary = a.primary.cmp(&b.primary);
            if descending {
                primary.reverse()
            } else {
                primary
            }
        })
        .then_with(|| a.tie_break.cmp(&b.tie_break))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ColumnDef, DefaultOrder};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        category: String,
        title: String,
        start_date: String,
        amount: CellValue,
        pinned: bool,
        index: Option<usize>,
    }

    impl ReportRow for Row {
        fn row_id(&self) -> &str {
            &self.id
        }

        fn cell(&self, column: &str) -> CellValue {
            match column {
                "category" => CellValue::Text(self.category.clone()),
                "title" => CellValue::Text(self.title.clone()),
                "startDate" => CellValue::Text(self.start_date.clone()),
                "amount" => self.amount.clone(),
                _ => CellValue::Null,
            }
        }

        fn display_index(&self) -> Option<usize> {
            self.index
        }

        fn set_display_index(&mut self, index: usize) {
            self.index = Some(index);
        }

        fn pinned(&self) -> bool {
            self.pinned
        }
    }

    fn row(id: &str, category: &str, title: &str) -> Row {
        Row {
            id: id.to_string(),
            category: category.to_string(),
            title: title.to_string(),
            start_date: String::new(),
            amount: CellValue::Null,
            pinned: false,
            index: None,
        }
    }

    fn layout() -> ReportLayout {
        ReportLayout {
            name: "test".to_string(),
            columns: vec![
                ColumnDef::new("index", "#").fixed(),
                ColumnDef::new("category", "구분").sort_rule(SortRule::LabelThenTieBreak),
                ColumnDef::new("title", "제목"),
                ColumnDef::new("startDate", "시작일"),
                ColumnDef::new("amount", "금액").number(),
            ],
            default_order: DefaultOrder {
                rank_column: "category".to_string(),
                tie_break: "title".to_string(),
                collate_unranked: false,
            },
        }
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_default_order_by_rank_then_title() {
        let layout = layout();
        let rows = vec![row("1", "A", "나"), row("2", "B", "가"), row("3", "A", "가")];
        let ranks = RankTable::from_labels(["A", "B"]);
        let ordered = Orderer::new(&layout).order(rows, &SortState::none(), &ranks, None);
        assert_eq!(ids(&ordered), vec!["3", "1", "2"]);
        let indices: Vec<_> = ordered.iter().map(|r| r.index.unwrap()).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_unranked_sorts_last() {
        let layout = layout();
        let rows = vec![row("1", "기타", "가"), row("2", "B", "나"), row("3", "없음", "다")];
        let ranks = RankTable::from_labels(["B"]);
        let ordered = Orderer::new(&layout).order(rows, &SortState::none(), &ranks, None);
        assert_eq!(ids(&ordered), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_rank_table_first_occurrence_wins() {
        let ranks = RankTable::from_labels(["A", "B", "A"]);
        assert_eq!(ranks.rank("A"), Some(0));
        assert_eq!(ranks.rank("B"), Some(1));
        assert_eq!(ranks.rank("C"), None);
        assert_eq!(ranks.len(), 2);
    }

    #[test]
    fn test_category_sort_breaks_ties_by_title_ascending() {
        let layout = layout();
        let rows = vec![row("1", "가", "b"), row("2", "나", "a"), row("3", "가", "a")];
        let orderer = Orderer::new(&layout);
        let ranks = RankTable::new();

        let asc = orderer.order(rows.clone(), &SortState::asc("category"), &ranks, None);
        assert_eq!(ids(&asc), vec!["3", "1", "2"]);

        let desc = orderer.order(rows, &SortState::desc("category"), &ranks, None);
        assert_eq!(ids(&desc), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let layout = layout();
        let mut rows = Vec::new();
        for (id, amount) in [("a", 100), ("b", 9), ("c", 25)] {
            let mut r = row(id, "", "");
            r.amount = CellValue::Int(amount);
            rows.push(r);
        }
        let ordered = Orderer::new(&layout).order(rows, &SortState::asc("amount"), &RankTable::new(), None);
        assert_eq!(ids(&ordered), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_mixed_values_numbers_before_text() {
        let layout = layout();
        let mut a = row("a", "", "");
        a.amount = CellValue::Text("미정".into());
        let mut b = row("b", "", "");
        b.amount = CellValue::Float(2.5);
        let c = row("c", "", "");
        let ordered = Orderer::new(&layout).order(vec![a, b, c], &SortState::asc("amount"), &RankTable::new(), None);
        assert_eq!(ids(&ordered), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let layout = layout();
        let rows = vec![row("1", "x", "same"), row("2", "y", "same"), row("3", "z", "same")];
        let ordered = Orderer::new(&layout).order(rows, &SortState::desc("title"), &RankTable::new(), None);
        assert_eq!(ids(&ordered), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_missing_direction_sorts_ascending() {
        let layout = layout();
        let rows = vec![row("1", "", "다"), row("2", "", "가")];
        let sort = SortState {
            key: Some("title".to_string()),
            direction: None,
        };
        let ordered = Orderer::new(&layout).order(rows, &sort, &RankTable::new(), None);
        assert_eq!(ids(&ordered), vec!["2", "1"]);
    }

    #[test]
    fn test_index_and_unknown_keys_use_default_order() {
        let layout = layout();
        let rows = vec![row("1", "B", "가"), row("2", "A", "가")];
        let ranks = RankTable::from_labels(["A", "B"]);
        let orderer = Orderer::new(&layout);
        for key in ["index", "nope"] {
            let ordered = orderer.order(rows.clone(), &SortState::desc(key), &ranks, None);
            assert_eq!(ids(&ordered), vec!["2", "1"]);
        }
    }

    #[test]
    fn test_year_filter_is_substring_and_reindexes() {
        let layout = layout();
        let mut rows = vec![row("1", "", "가"), row("2", "", "나"), row("3", "", "다")];
        rows[0].start_date = "2024-03-01".into();
        rows[1].start_date = " 2025-01-10 ".into();
        rows[2].start_date = "2025.05".into();
        let ordered = Orderer::new(&layout).order(rows, &SortState::asc("title"), &RankTable::new(), Some("2025"));
        assert_eq!(ids(&ordered), vec!["2", "3"]);
        assert_eq!(ordered[0].index, Some(1));
        assert_eq!(ordered[1].index, Some(2));
    }

    #[test]
    fn test_blank_year_means_no_filter() {
        let layout = layout();
        let rows = vec![row("1", "", ""), row("2", "", "")];
        let ordered = Orderer::new(&layout).order(rows, &SortState::none(), &RankTable::new(), Some(" "));
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn test_pinned_rows_stay_first() {
        let layout = layout();
        let mut pinned = row("admin", "", "하");
        pinned.pinned = true;
        let rows = vec![row("1", "", "가"), pinned, row("2", "", "나")];
        let orderer = Orderer::new(&layout);
        let asc = orderer.order(rows.clone(), &SortState::asc("title"), &RankTable::new(), None);
        assert_eq!(ids(&asc), vec!["admin", "1", "2"]);
        let desc = orderer.order(rows, &SortState::desc("title"), &RankTable::new(), None);
        assert_eq!(ids(&desc), vec!["admin", "2", "1"]);
    }

    #[test]
    fn test_ranked_rule_and_collated_unranked() {
        let mut layout = layout();
        layout.columns[1].sort_rule = SortRule::Ranked;
        layout.default_order.collate_unranked = true;
        let rows = vec![row("1", "다", "x"), row("2", "B", "x"), row("3", "가", "x")];
        let ranks = RankTable::from_labels(["B"]);
        let orderer = Orderer::new(&layout);

        let default = orderer.order(rows.clone(), &SortState::none(), &ranks, None);
        assert_eq!(ids(&default), vec!["2", "3", "1"]);

        let desc = orderer.order(rows, &SortState::desc("category"), &ranks, None);
        assert_eq!(ids(&desc), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_sort_state_toggle() {
        let state = SortState::none().toggled("title");
        assert_eq!(state, SortState::asc("title"));
        let state = state.toggled("title");
        assert_eq!(state, SortState::desc("title"));
        let state = state.toggled("title");
        assert_eq!(state, SortState::asc("title"));
        assert_eq!(state.toggled("place"), SortState::asc("place"));
    }
}
