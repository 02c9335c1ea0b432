/// Program Report - Aggregation, Filter, Ordering and Totals Engine
///
/// Turns raw library program records (classes and events with dated
/// sessions and budget items) into the rows, filters, ordering and totals
/// of a report screen. Every stage is a pure function over in-memory rows:
///
/// aggregate → filter → order → summarize
///
/// The stages are generic over [`ReportRow`], so the same pipeline drives
/// the program status screen ([`DerivedRow`]) and the user management
/// screen ([`UserRow`]).

pub mod error;
pub mod value;
pub mod collate;
pub mod record;
pub mod columns;
pub mod row;
pub mod aggregate;
pub mod filter;
pub mod order;
pub mod summary;
pub mod pipeline;
pub mod source;
pub mod budget;
pub mod stats;
pub mod config;

pub use error::{ReportError, Result};
pub use value::{CategoryLabel, CellValue};
pub use record::{Attendance, BudgetItem, Performance, RawRecord, UserAccount, UserDirectory};
pub use columns::{ColumnDef, ColumnKind, DefaultOrder, ReportLayout, SortRule, TotalKind, INDEX_COLUMN};
pub use row::{DerivedRow, ReportRow, UserRow};
pub use aggregate::{aggregate, aggregate_values, derive_row, AggregationConfig, BudgetBucket};
pub use filter::{distinct_values, ColumnFilterState, ColumnFilters};
pub use order::{Orderer, RankTable, SortDirection, SortState};
pub use summary::{summarize, Totals};
pub use pipeline::{load_status_report, load_user_report, LoadTicket, Pipeline, ReportSession, ViewModel};
pub use source::{RecordSource, Scope, Snapshot};
pub use budget::{load_budget_summary, BudgetDetail, BudgetLine, BudgetSummary, BudgetTotals};
pub use stats::{
    dashboard_summary, monthly_statistics, schedule_by_date, DashboardCard, GroupStats, MonthlyStatistics,
    ScheduleEntry, StatGroup,
};
pub use config::ReportConfig;
