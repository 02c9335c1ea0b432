/// Attendance statistics, the year dashboard and the session schedule
///
/// Programs are grouped by the prefix of their category label. For a given
/// month only sessions held in that month count: a program with at least
/// one such session adds one to its group's program count and contributes
/// the attendance of those sessions.
///
/// [`dashboard_summary`] totals whole programs per group for the year and
/// [`schedule_by_date`] lists every dated session by day.
///
/// # Examples
///
/// ```
/// use program_report::{monthly_statistics, RawRecord, StatGroup};
/// use serde_json::json;
///
/// let records = RawRecord::parse_all(&[json!({
///     "id": "p1",
///     "overview": {"category": "독서문화행사 > 강연 > 성인"},
///     "performances": [
///         {"opDate": "2025-03-08", "adultM": 4, "adultF": 6},
///         {"opDate": "2025-04-12", "adultF": 9}
///     ]
/// })]).unwrap();
///
/// let stats = monthly_statistics(&records, 2025, 3, &StatGroup::defaults());
/// assert_eq!(stats.groups[1].count, 1);
/// assert_eq!(stats.groups[1].attendance.grand_total(), 10);
/// assert_eq!(stats.total.count, 1);
/// ```

use crate::aggregate::BudgetBucket;
use crate::collate::compare;
use crate::record::{Attendance, RawRecord};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;

/// A statistics row: programs whose category label starts with
/// `category_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatGroup {
    pub label: String,
    pub category_prefix: String,
}

impl StatGroup {
    pub fn new(label: impl Into<String>, category_prefix: impl Into<String>) -> Self {
        StatGroup {
            label: label.into(),
            category_prefix: category_prefix.into(),
        }
    }

    /// Lifelong-learning courses and reading-culture events.
    pub fn defaults() -> Vec<StatGroup> {
        vec![
            StatGroup::new("평생교육강좌", "평생교육강좌"),
            StatGroup::new("독서문화행사", "독서문화행사"),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupStats {
    pub label: String,
    /// Programs with at least one session in the month
    pub count: usize,
    pub attendance: Attendance,
}

impl GroupStats {
    fn empty(label: &str) -> Self {
        GroupStats {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn absorb(&mut self, other: &GroupStats) {
        self.count += other.count;
        self.attendance.add(&other.attendance);
    }

    pub fn to_json(&self) -> JsonValue {
        let a = &self.attendance;
        json!({
            "label": self.label,
            "count": self.count,
            "adultMale": a.adult_male,
            "adultFemale": a.adult_female,
            "adultTotal": a.adult_total(),
            "teenMale": a.teen_male,
            "teenFemale": a.teen_female,
            "teenTotal": a.teen_total(),
            "childMale": a.child_male,
            "childFemale": a.child_female,
            "childTotal": a.child_total(),
            "maleTotal": a.male_total(),
            "femaleTotal": a.female_total(),
            "grandTotal": a.grand_total(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyStatistics {
    pub year: i32,
    pub month: u32,
    pub groups: Vec<GroupStats>,
    pub total: GroupStats,
}

impl MonthlyStatistics {
    pub fn to_json(&self) -> JsonValue {
        let groups: Vec<JsonValue> = self.groups.iter().map(GroupStats::to_json).collect();
        json!({
            "year": self.year,
            "month": self.month,
            "groups": groups,
            "total": self.total.to_json(),
        })
    }
}

pub const TOTAL_LABEL: &str = "합계";

/// Statistics for `month` (1-12) of `year`.
pub fn monthly_statistics(records: &[RawRecord], year: i32, month: u32, groups: &[StatGroup]) -> MonthlyStatistics {
    let mut stats: Vec<GroupStats> = groups.iter().map(|g| GroupStats::empty(&g.label)).collect();

    for record in records {
        let Some(position) = group_of(record, groups) else {
            continue;
        };

        let mut held = false;
        let mut attendance = Attendance::default();
        for performance in &record.performances {
            let in_month = performance
                .operation_date
                .as_deref()
                .and_then(parse_date)
                .map(|date| date.year() == year && date.month() == month)
                .unwrap_or(false);
            if in_month {
                held = true;
                attendance.add(&performance.attendance);
            }
        }

        if held {
            let group = &mut stats[position];
            group.count += 1;
            group.attendance.add(&attendance);
        }
    }

    let mut total = GroupStats::empty(TOTAL_LABEL);
    for group in &stats {
        total.absorb(group);
    }

    MonthlyStatistics {
        year,
        month,
        groups: stats,
        total,
    }
}

fn group_of(record: &RawRecord, groups: &[StatGroup]) -> Option<usize> {
    let label = record.category().to_display_label();
    groups
        .iter()
        .position(|g| label.starts_with(g.category_prefix.as_str()))
}

/// One dashboard card: whole-program totals for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCard {
    pub label: String,
    pub programs: usize,
    /// Sum of the planned session counts (`overview.count`)
    pub sessions: i64,
    /// Budget items whose code is one of the bucket codes
    pub budget: i64,
    pub participants: i64,
}

/// Overview key holding a program's planned number of sessions.
pub const SESSION_COUNT_FIELD: &str = "count";

/// Year totals per group, one card per entry of `groups`.
pub fn dashboard_summary(
    records: &[RawRecord],
    groups: &[StatGroup],
    buckets: &[BudgetBucket],
) -> Vec<DashboardCard> {
    let mut cards: Vec<DashboardCard> = groups
        .iter()
        .map(|g| DashboardCard {
            label: g.label.clone(),
            ..Default::default()
        })
        .collect();

    for record in records {
        let Some(position) = group_of(record, groups) else {
            continue;
        };
        let card = &mut cards[position];
        card.programs += 1;
        card.sessions = card
            .sessions
            .saturating_add(record.overview_value(SESSION_COUNT_FIELD).to_amount());
        for item in &record.budget_items {
            if buckets.iter().any(|b| b.code == item.classification_code) {
                card.budget = card.budget.saturating_add(item.amount);
            }
        }
        for performance in &record.performances {
            card.participants = card
                .participants
                .saturating_add(performance.attendance.grand_total());
        }
    }

    cards
}

/// A session on the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub record_id: String,
    pub title: String,
    pub start_time: String,
}

/// Time used for entries without a start time.
const MIDNIGHT: &str = "00:00";

/// Sessions keyed by their stored date, each day ordered by start time
/// and then title. Sessions without a date are not scheduled.
pub fn schedule_by_date(records: &[RawRecord]) -> BTreeMap<String, Vec<ScheduleEntry>> {
    let mut days: BTreeMap<String, Vec<ScheduleEntry>> = BTreeMap::new();
    for record in records {
        for performance in &record.performances {
            let Some(date) = performance.operation_date.as_deref().filter(|d| !d.is_empty()) else {
                continue;
            };
            days.entry(date.to_string()).or_default().push(ScheduleEntry {
                record_id: record.id.clone(),
                title: record.overview_text("title"),
                start_time: record.overview_text("startTime"),
            });
        }
    }

    let time = |entry: &ScheduleEntry| {
        if entry.start_time.is_empty() {
            MIDNIGHT.to_string()
        } else {
            entry.start_time.clone()
        }
    };
    for entries in days.values_mut() {
        entries.sort_by(|a, b| time(a).cmp(&time(b)).then_with(|| compare(&a.title, &b.title)));
    }
    days
}

/// Neighbouring month within the same year, `None` at the year's edges.
pub fn step_month(month: u32, forward: bool) -> Option<u32> {
    match (month, forward) {
        (1..=11, true) => Some(month + 1),
        (2..=12, false) => Some(month - 1),
        _ => None,
    }
}

/// Calendar date of a session date in any of the stored formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}
