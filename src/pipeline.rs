/// Report pipeline and session state
///
/// [`Pipeline`] is the fixed composition filter → order → summarize over an
/// already aggregated row universe. It is pure: the same inputs always give
/// the same [`ViewModel`].
///
/// [`ReportSession`] holds the state a screen keeps between interactions
/// (the universe, filters, sort, selected year and rank table) and re-runs
/// the pipeline on demand. Loading follows a last-request-wins rule: every
/// [`ReportSession::begin_load`] issues a newer ticket, and finishing an
/// older one is discarded.
///
/// # Examples
///
/// ```
/// use program_report::{ReportLayout, ReportSession, RankTable};
/// # use program_report::{aggregate_values, AggregationConfig, UserDirectory};
/// # use serde_json::json;
/// # let rows = aggregate_values(&[
/// #     json!({"id": "1", "overview": {"category": "강좌", "title": "가"},
/// #            "performances": [{"adultMale": 2}]}),
/// #     json!({"id": "2", "overview": {"category": "행사", "title": "나"},
/// #            "performances": [{"adultFemale": 3}]}),
/// # ], &UserDirectory::new(), &AggregationConfig::default()).unwrap();
///
/// let mut session = ReportSession::new(ReportLayout::status());
/// session.reload(rows, RankTable::from_labels(["강좌", "행사"]));
/// assert_eq!(session.view().totals.get("grandTotal"), Some(5));
///
/// session.toggle_value("category", "행사", false).unwrap();
/// let view = session.view();
/// assert_eq!(view.rows.len(), 1);
/// assert_eq!(view.totals.get("grandTotal"), Some(2));
/// ```

use crate::aggregate::aggregate;
use crate::columns::ReportLayout;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::filter::{distinct_values, ColumnFilters};
use crate::order::{Orderer, RankTable, SortState};
use crate::row::{DerivedRow, ReportRow, UserRow};
use crate::source::RecordSource;
use crate::summary::{summarize, Totals};
use log::{debug, warn};
use serde_json::{json, Value as JsonValue};

/// Visible rows and their totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel<R> {
    pub rows: Vec<R>,
    pub totals: Totals,
}

impl<R: ReportRow> ViewModel<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `{"rows": [...], "totals": {...}}` with one object per row holding
    /// every layout column.
    pub fn to_json(&self, layout: &ReportLayout) -> JsonValue {
        let keys = layout.keys();
        let rows: Vec<JsonValue> = self.rows.iter().map(|row| row.to_json(&keys)).collect();
        json!({
            "rows": rows,
            "totals": self.totals.to_json(layout),
        })
    }
}

/// filter → order → summarize for one layout.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    layout: &'a ReportLayout,
}

impl<'a> Pipeline<'a> {
    pub fn new(layout: &'a ReportLayout) -> Self {
        Pipeline { layout }
    }

    pub fn run<R: ReportRow>(
        &self,
        universe: &[R],
        filters: &ColumnFilters,
        sort: &SortState,
        ranks: &RankTable,
        year: Option<&str>,
    ) -> ViewModel<R> {
        let filtered = filters.apply(universe);
        let filtered_len = filtered.len();
        let rows = Orderer::new(self.layout).order(filtered, sort, ranks, year);
        let totals = summarize(&rows, self.layout);
        debug!(
            "{}: {} rows, {} after filters, {} visible",
            self.layout.name,
            universe.len(),
            filtered_len,
            rows.len()
        );
        ViewModel { rows, totals }
    }
}

/// Ticket for one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Caller-owned state of one report screen.
#[derive(Debug, Clone)]
pub struct ReportSession<R> {
    layout: ReportLayout,
    universe: Vec<R>,
    ranks: RankTable,
    filters: ColumnFilters,
    sort: SortState,
    year: Option<String>,
    /// Latest ticket issued by `begin_load`
    generation: u64,
}

impl<R: ReportRow> ReportSession<R> {
    pub fn new(layout: ReportLayout) -> Self {
        ReportSession {
            layout,
            universe: Vec::new(),
            ranks: RankTable::new(),
            filters: ColumnFilters::new(),
            sort: SortState::none(),
            year: None,
            generation: 0,
        }
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    pub fn universe(&self) -> &[R] {
        &self.universe
    }

    pub fn filters(&self) -> &ColumnFilters {
        &self.filters
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    /// Replace the universe and reset every column filter to "all".
    pub fn reload(&mut self, universe: Vec<R>, ranks: RankTable) {
        self.filters = ColumnFilters::initialize(&universe, &self.layout.filter_columns());
        self.universe = universe;
        self.ranks = ranks;
    }

    /// Swap one row in place, keeping the current filter state. A value the
    /// new row introduces is not in any included set, so the row stays
    /// hidden until the next [`reload`](Self::reload).
    pub fn replace_row(&mut self, row: R) -> bool {
        match self
            .universe
            .iter_mut()
            .find(|existing| existing.row_id() == row.row_id())
        {
            Some(existing) => {
                *existing = row;
                true
            }
            None => false,
        }
    }

    /// Start a load. Only the most recently issued ticket can finish.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    /// Install a loaded universe unless a newer load has started since
    /// `ticket` was issued. Returns whether the data was installed.
    pub fn finish_load(&mut self, ticket: LoadTicket, universe: Vec<R>, ranks: RankTable) -> bool {
        if ticket.0 != self.generation {
            warn!(
                "{}: discarding stale load {} (latest is {})",
                self.layout.name, ticket.0, self.generation
            );
            return false;
        }
        self.reload(universe, ranks);
        true
    }

    fn check_column(&self, column: &str) -> Result<()> {
        match self.layout.column(column) {
            Some(_) => Ok(()),
            None => Err(ReportError::UnknownColumn(column.to_string())),
        }
    }

    fn check_filter_column(&self, column: &str) -> Result<()> {
        if self.layout.filter_columns().contains(&column) {
            Ok(())
        } else {
            Err(ReportError::UnknownColumn(column.to_string()))
        }
    }

    pub fn set_sort(&mut self, sort: SortState) -> Result<()> {
        if let Some(key) = &sort.key {
            self.check_column(key)?;
        }
        self.sort = sort;
        Ok(())
    }

    /// Header click on `column`.
    pub fn toggle_sort(&mut self, column: &str) -> Result<()> {
        self.check_column(column)?;
        self.sort = self.sort.toggled(column);
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.sort = SortState::none();
    }

    pub fn set_search(&mut self, column: &str, text: &str) -> Result<()> {
        self.check_filter_column(column)?;
        self.filters = std::mem::take(&mut self.filters).set_search(column, text);
        Ok(())
    }

    pub fn toggle_value(&mut self, column: &str, value: &str, included: bool) -> Result<()> {
        self.check_filter_column(column)?;
        self.filters =
            std::mem::take(&mut self.filters).toggle_value(&self.universe, column, value, included);
        Ok(())
    }

    /// Check or uncheck every current value of a column.
    pub fn set_all(&mut self, column: &str, included: bool) -> Result<()> {
        self.check_filter_column(column)?;
        let all_values = distinct_values(&self.universe, column);
        self.filters = std::mem::take(&mut self.filters).set_all(column, included, all_values);
        Ok(())
    }

    /// Checkbox options for a column's filter popup.
    pub fn filter_options(&self, column: &str) -> Result<Vec<String>> {
        self.check_filter_column(column)?;
        Ok(distinct_values(&self.universe, column).into_iter().collect())
    }

    pub fn set_year(&mut self, year: Option<String>) {
        self.year = year.filter(|y| !y.trim().is_empty());
    }

    pub fn view(&self) -> ViewModel<R> {
        Pipeline::new(&self.layout).run(
            &self.universe,
            &self.filters,
            &self.sort,
            &self.ranks,
            self.year.as_deref(),
        )
    }
}

/// Fetch, aggregate and install the status screen for `config`'s scope.
pub fn load_status_report<S>(source: &S, config: &ReportConfig) -> Result<ReportSession<DerivedRow>>
where
    S: RecordSource + ?Sized,
{
    let scope = config.scope();
    let records = source.fetch_records(&scope)?;
    let users = source.fetch_user_directory()?;
    let categories = source.fetch_category_order(&scope, &config.category_list_key)?;
    debug!(
        "loaded {} records, {} users, {} categories",
        records.len(),
        users.len(),
        categories.len()
    );

    let rows = aggregate(&records, &users, &config.aggregation);
    let ranks = RankTable::from_labels(categories.iter().map(|c| c.to_display_label()));

    let mut session = ReportSession::new(config.layout());
    session.reload(rows, ranks);
    session.set_year(config.year.clone());
    Ok(session)
}

/// Fetch accounts and install the user management screen. Libraries are
/// ranked by `config.library_order`.
pub fn load_user_report<S>(source: &S, config: &ReportConfig) -> Result<ReportSession<UserRow>>
where
    S: RecordSource + ?Sized,
{
    let rows: Vec<UserRow> = source
        .fetch_users()?
        .iter()
        .map(|account| UserRow::from_account(account, config.aggregation.utc_offset_minutes))
        .collect();
    let mut session = ReportSession::new(ReportLayout::users());
    session.reload(rows, RankTable::from_labels(&config.library_order));
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_values, AggregationConfig};
    use crate::record::UserDirectory;
    use crate::source::Snapshot;

    fn universe() -> Vec<DerivedRow> {
        aggregate_values(
            &[
                json!({"id": "1", "overview": {"category": "행사", "title": "북콘서트", "place": "강당", "startDate": "2025-03-02"},
                       "performances": [{"adultMale": 10, "adultFemale": 12}]}),
                json!({"id": "2", "overview": {"category": "강좌", "title": "수채화", "place": "", "startDate": "2025-04-01"},
                       "performances": [{"childMale": 3}]}),
                json!({"id": "3", "overview": {"category": "강좌", "title": "글쓰기", "place": "세미나실", "startDate": "2024-11-20"},
                       "performances": [{"teenFemale": 4}]}),
            ],
            &UserDirectory::new(),
            &AggregationConfig::default(),
        )
        .unwrap()
    }

    fn ids(view: &ViewModel<DerivedRow>) -> Vec<&str> {
        view.rows.iter().map(|r| r.id.as_str()).collect()
    }

    fn session() -> ReportSession<DerivedRow> {
        let mut session = ReportSession::new(ReportLayout::status());
        session.reload(universe(), RankTable::from_labels(["강좌", "행사"]));
        session
    }

    #[test]
    fn test_pipeline_default_view() {
        let session = session();
        let view = session.view();
        assert_eq!(ids(&view), vec!["3", "2", "1"]);
        assert_eq!(view.totals.row_count, 3);
        assert_eq!(view.totals.get("grandTotal"), Some(29));
        let indices: Vec<_> = view.rows.iter().map(|r| r.display_index.unwrap()).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_pipeline_is_pure() {
        let layout = ReportLayout::status();
        let rows = universe();
        let filters = ColumnFilters::initialize(&rows, &layout.filter_columns());
        let pipeline = Pipeline::new(&layout);
        let ranks = RankTable::new();
        let first = pipeline.run(&rows, &filters, &SortState::desc("grandTotal"), &ranks, None);
        let second = pipeline.run(&rows, &filters, &SortState::desc("grandTotal"), &ranks, None);
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["1", "3", "2"]);
        assert!(rows.iter().all(|r| r.display_index.is_none()));
    }

    #[test]
    fn test_empty_included_set_zeroes_totals() {
        let mut session = session();
        session.set_all("category", false).unwrap();
        let view = session.view();
        assert!(view.is_empty());
        assert!(view.totals.is_zero());
        assert_eq!(view.totals.row_count, 0);
    }

    #[test]
    fn test_year_and_search() {
        let mut session = session();
        session.set_year(Some("2025".to_string()));
        assert_eq!(ids(&session.view()), vec!["2", "1"]);

        session.set_search("title", "콘서트").unwrap();
        let view = session.view();
        assert_eq!(ids(&view), vec!["1"]);
        assert_eq!(view.rows[0].display_index, Some(1));
    }

    #[test]
    fn test_blank_place_hidden_once_narrowed() {
        let mut session = session();
        assert_eq!(session.view().len(), 3);
        session.toggle_value("place", "강당", false).unwrap();
        assert_eq!(ids(&session.view()), vec!["3"]);
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let mut session = session();
        assert!(matches!(session.set_search("nope", "x"), Err(ReportError::UnknownColumn(_))));
        assert!(session.toggle_value("index", "1", false).is_err());
        assert!(session.set_sort(SortState::asc("nope")).is_err());
        assert!(session.set_sort(SortState::asc("title")).is_ok());
        assert!(session.toggle_sort("title").is_ok());
        assert_eq!(session.sort(), &SortState::desc("title"));
    }

    #[test]
    fn test_reload_resets_filters_and_replace_row_keeps_them() {
        let mut session = session();
        session.toggle_value("category", "행사", false).unwrap();
        assert_eq!(session.view().len(), 2);

        let mut changed = universe()[1].clone();
        changed.overview.insert("category".to_string(), "전시".into());
        assert!(session.replace_row(changed));
        assert_eq!(ids(&session.view()), vec!["3"]);

        session.reload(universe(), RankTable::new());
        assert_eq!(session.view().len(), 3);
        assert!(!session.replace_row(DerivedRow {
            id: "missing".to_string(),
            ..universe()[0].clone()
        }));
    }

    #[test]
    fn test_last_load_wins() {
        let mut session: ReportSession<DerivedRow> = ReportSession::new(ReportLayout::status());
        let first = session.begin_load();
        let second = session.begin_load();
        assert!(first < second);

        assert!(session.finish_load(second, universe(), RankTable::new()));
        assert!(!session.finish_load(first, Vec::new(), RankTable::new()));
        assert_eq!(session.universe().len(), 3);
    }

    #[test]
    fn test_filter_options() {
        let session = session();
        assert_eq!(session.filter_options("place").unwrap(), vec!["강당", "세미나실"]);
        assert!(session.filter_options("index").is_err());
    }

    #[test]
    fn test_view_model_json() {
        let session = session();
        let json = session.view().to_json(session.layout());
        let rows = json["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["index"], 1);
        assert_eq!(rows[0]["title"], "글쓰기");
        assert_eq!(json["totals"]["title"], 3);
        assert_eq!(json["totals"]["adultTotal"], 22);
    }

    #[test]
    fn test_load_status_report_from_snapshot() {
        let snapshot = Snapshot::from_json(
            r#"{
                "users": [{"id": "u1", "name": "김사서"}],
                "categories": [{"key": "2025_구분", "items": ["행사", "강좌"]}],
                "entries": [
                    {"id": "a", "userId": "u1", "overview": {"year": "2025", "category": "강좌", "title": "가", "startDate": "2025-01-01"}},
                    {"id": "b", "overview": {"year": "2025", "category": "행사", "title": "나", "startDate": "2025-02-01"}},
                    {"id": "c", "overview": {"year": "2024", "category": "행사", "title": "다", "startDate": "2024-02-01"}}
                ]
            }"#,
        )
        .unwrap();
        let config = ReportConfig {
            year: Some("2025".to_string()),
            ..Default::default()
        };
        let session = load_status_report(&snapshot, &config).unwrap();
        let view = session.view();
        assert_eq!(ids(&view), vec!["b", "a"]);
        assert_eq!(view.rows[1].assignee_name, "김사서");
        assert_eq!(view.rows[0].assignee_name, "Unknown");
    }

    #[test]
    fn test_load_user_report_pins_admin() {
        let snapshot = Snapshot::from_json(
            r#"{
                "users": [
                    {"id": "1", "name": "나사서", "libraryName": "서부도서관", "isApproved": true},
                    {"id": "2", "name": "관리", "isAdmin": true},
                    {"id": "3", "name": "가사서", "libraryName": "동부도서관"},
                    {"id": "4", "name": "다사서", "libraryName": "기타도서관"}
                ]
            }"#,
        )
        .unwrap();
        let config = ReportConfig {
            library_order: vec!["동부도서관".to_string(), "서부도서관".to_string()],
            ..Default::default()
        };
        let session = load_user_report(&snapshot, &config).unwrap();
        let view = session.view();
        let ids: Vec<&str> = view.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1", "4"]);
        assert_eq!(view.totals.row_count, 4);
    }
}
