/// Record aggregation
///
/// Turns raw program records into flat [`DerivedRow`]s: attendance summed
/// over every session, budget amounts routed into subtotal columns by
/// classification code, the owner resolved to a display name and the update
/// time formatted for display.
///
/// Aggregation is pure. It never fails on values (missing or malformed
/// counts are zero, unknown budget codes are ignored, unknown owners become
/// the configured placeholder); only [`aggregate_values`] can fail, and only
/// when a record's *shape* is wrong.
///
/// # Examples
///
/// ```
/// use program_report::{aggregate_values, AggregationConfig, ReportRow, UserDirectory};
/// use serde_json::json;
///
/// let records = vec![json!({
///     "id": "p1",
///     "overview": {"category": "독서문화행사", "title": "작가와의 만남"},
///     "budgetItems": [
///         {"classificationCode": "210-01", "amount": 1000},
///         {"classificationCode": "999-99", "amount": 500}
///     ],
///     "performances": [{"adultMale": 3, "adultFemale": 4}, {"childMale": 2}]
/// })];
///
/// let rows = aggregate_values(&records, &UserDirectory::new(), &AggregationConfig::default()).unwrap();
/// assert_eq!(rows[0].cell("amt21001").to_amount(), 1000);
/// assert_eq!(rows[0].cell("amt21006").to_amount(), 0);
/// assert_eq!(rows[0].cell("grandTotal").to_amount(), 9);
/// assert_eq!(rows[0].assignee_name, "Unknown");
/// ```

use crate::error::Result;
use crate::record::{Attendance, RawRecord, UserDirectory};
use crate::row::{format_timestamp, DerivedRow};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Routes budget items with `code` into the subtotal column `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetBucket {
    pub code: String,
    pub column: String,
}

impl BudgetBucket {
    pub fn new(code: impl Into<String>, column: impl Into<String>) -> Self {
        BudgetBucket {
            code: code.into(),
            column: column.into(),
        }
    }
}

/// Settings for turning raw records into rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregationConfig {
    pub budget_buckets: Vec<BudgetBucket>,
    /// Assignee shown when the owner is not in the user directory
    pub unknown_assignee: String,
    /// Offset used to render `updatedAt`
    pub utc_offset_minutes: i32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            budget_buckets: vec![
                BudgetBucket::new("210-01", "amt21001"),
                BudgetBucket::new("210-06", "amt21006"),
                BudgetBucket::new("310-06", "amt31006"),
            ],
            unknown_assignee: "Unknown".to_string(),
            utc_offset_minutes: 9 * 60,
        }
    }
}

/// Flatten one record.
pub fn derive_row(record: &RawRecord, users: &UserDirectory, config: &AggregationConfig) -> DerivedRow {
    let mut attendance = Attendance::default();
    for performance in &record.performances {
        attendance.add(&performance.attendance);
    }

    let mut budget: BTreeMap<String, i64> = config
        .budget_buckets
        .iter()
        .map(|b| (b.column.clone(), 0))
        .collect();
    for item in &record.budget_items {
        if let Some(bucket) = config
            .budget_buckets
            .iter()
            .find(|b| b.code == item.classification_code)
        {
            if let Some(total) = budget.get_mut(&bucket.column) {
                *total = total.saturating_add(item.amount);
            }
        }
    }

    let assignee_name = record
        .owner_user_id
        .as_deref()
        .and_then(|id| users.resolve(id))
        .unwrap_or(config.unknown_assignee.as_str())
        .to_string();

    let updated_at = record
        .updated_at
        .as_deref()
        .map(|ts| format_timestamp(ts, config.utc_offset_minutes))
        .unwrap_or_default();

    DerivedRow {
        id: record.id.clone(),
        overview: record.overview.clone(),
        attendance,
        budget,
        assignee_name,
        updated_at,
        display_index: None,
    }
}

/// Flatten typed records. Output order follows input order but callers
/// must not rely on it; ordering belongs to the orderer.
pub fn aggregate(records: &[RawRecord], users: &UserDirectory, config: &AggregationConfig) -> Vec<DerivedRow> {
    records
        .iter()
        .map(|record| derive_row(record, users, config))
        .collect()
}

/// Validate the shape of raw JSON records and flatten them.
pub fn aggregate_values(
    values: &[JsonValue],
    users: &UserDirectory,
    config: &AggregationConfig,
) -> Result<Vec<DerivedRow>> {
    let records = RawRecord::parse_all(values)?;
    Ok(aggregate(&records, users, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::record::{BudgetItem, Performance};
    use crate::row::ReportRow;
    use crate::value::CellValue;
    use serde_json::json;

    fn performance(counts: [i64; 6]) -> Performance {
        Performance {
            operation_date: None,
            attendance: Attendance {
                adult_male: counts[0],
                adult_female: counts[1],
                teen_male: counts[2],
                teen_female: counts[3],
                child_male: counts[4],
                child_female: counts[5],
            },
        }
    }

    fn budget(code: &str, amount: i64) -> BudgetItem {
        BudgetItem {
            classification_code: code.to_string(),
            amount,
            ..Default::default()
        }
    }

    #[test]
    fn test_attendance_sums_across_sessions() {
        let mut record = RawRecord::new("a");
        record.performances = vec![
            performance([1, 2, 3, 4, 5, 6]),
            performance([10, 20, 30, 40, 50, 60]),
        ];
        let row = derive_row(&record, &UserDirectory::new(), &AggregationConfig::default());
        assert_eq!(row.cell("adultMale"), CellValue::Int(11));
        assert_eq!(row.cell("childFemale"), CellValue::Int(66));
        assert_eq!(row.cell("teenTotal"), CellValue::Int(77));
        assert_eq!(row.cell("maleTotal"), CellValue::Int(99));
        assert_eq!(row.cell("femaleTotal"), CellValue::Int(132));
        assert_eq!(row.cell("grandTotal"), CellValue::Int(231));
    }

    #[test]
    fn test_budget_routing() {
        let mut record = RawRecord::new("b");
        record.budget_items = vec![
            budget("210-01", 1000),
            budget("999-99", 500),
            budget("210-01", 250),
            budget("310-06", 70),
        ];
        let row = derive_row(&record, &UserDirectory::new(), &AggregationConfig::default());
        assert_eq!(row.budget["amt21001"], 1250);
        assert_eq!(row.budget["amt21006"], 0);
        assert_eq!(row.budget["amt31006"], 70);
        assert_eq!(row.budget.len(), 3);
    }

    #[test]
    fn test_custom_budget_buckets() {
        let config = AggregationConfig {
            budget_buckets: vec![BudgetBucket::new("410-01", "capital")],
            ..Default::default()
        };
        let mut record = RawRecord::new("c");
        record.budget_items = vec![budget("410-01", 9), budget("210-01", 1)];
        let row = derive_row(&record, &UserDirectory::new(), &config);
        assert_eq!(row.cell("capital"), CellValue::Int(9));
        assert!(row.cell("amt21001").is_null());
    }

    #[test]
    fn test_assignee_resolution() {
        let mut users = UserDirectory::new();
        users.insert("u1", "이담당");
        let mut record = RawRecord::new("d");
        record.owner_user_id = Some("u1".to_string());
        let config = AggregationConfig::default();
        assert_eq!(derive_row(&record, &users, &config).assignee_name, "이담당");

        record.owner_user_id = Some("ghost".to_string());
        assert_eq!(derive_row(&record, &users, &config).assignee_name, "Unknown");

        record.owner_user_id = None;
        assert_eq!(derive_row(&record, &users, &config).assignee_name, "Unknown");
    }

    #[test]
    fn test_updated_at_formatting() {
        let mut record = RawRecord::new("e");
        record.updated_at = Some("2025-04-30T15:30:00Z".to_string());
        let row = derive_row(&record, &UserDirectory::new(), &AggregationConfig::default());
        assert_eq!(row.updated_at, "2025-05-01 00:30");

        record.updated_at = None;
        let row = derive_row(&record, &UserDirectory::new(), &AggregationConfig::default());
        assert_eq!(row.updated_at, "");
    }

    #[test]
    fn test_aggregate_is_deterministic_and_leaves_input_alone() {
        let mut record = RawRecord::new("f");
        record.performances = vec![performance([1, 1, 1, 1, 1, 1])];
        let records = vec![record.clone(), RawRecord::new("g")];
        let users = UserDirectory::new();
        let config = AggregationConfig::default();
        let first = aggregate(&records, &users, &config);
        let second = aggregate(&records, &users, &config);
        assert_eq!(first, second);
        assert_eq!(records[0], record);
    }

    #[test]
    fn test_aggregate_values_rejects_bad_shape() {
        let values = vec![json!({"id": "ok"}), json!({"id": "bad", "performances": "lots"})];
        let err = aggregate_values(&values, &UserDirectory::new(), &AggregationConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReportError::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn test_aggregate_values_tolerates_bad_values() {
        let values = vec![json!({
            "id": "x",
            "performances": [{"adultM": "many", "adultF": 2.9, "teenM": {"n": 1}}],
            "budgetItems": [{"v5": "210-06", "amount": "12,000"}]
        })];
        let rows = aggregate_values(&values, &UserDirectory::new(), &AggregationConfig::default())
            .unwrap();
        assert_eq!(rows[0].attendance.adult_male, 0);
        assert_eq!(rows[0].attendance.adult_female, 2);
        assert_eq!(rows[0].attendance.teen_male, 0);
        assert_eq!(rows[0].budget["amt21006"], 12000);
    }

    #[test]
    fn test_oversized_values_saturate() {
        let values = vec![json!({
            "id": "huge",
            "performances": [{"adultM": 9223372036854775807i64}, {"adultM": 1, "childF": 2}],
            "budgetItems": [{"v5": "210-01", "amount": 1e30}, {"v5": "210-01", "amount": 5}]
        })];
        let rows = aggregate_values(&values, &UserDirectory::new(), &AggregationConfig::default())
            .unwrap();
        assert_eq!(rows[0].attendance.adult_male, i64::MAX);
        assert_eq!(rows[0].cell("grandTotal"), CellValue::Int(i64::MAX));
        assert_eq!(rows[0].budget["amt21001"], i64::MAX);
    }
}
