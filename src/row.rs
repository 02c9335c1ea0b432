/// Report rows
///
/// Every screen's row type implements [`ReportRow`], which is all the
/// filter, ordering and totals stages need: a cell lookup by column key and
/// a slot for the display index. Two row types live here:
///
/// - [`DerivedRow`]: one program record flattened for the status screen
/// - [`UserRow`]: one account projected for the user management screen

use crate::columns::INDEX_COLUMN;
use crate::record::{Attendance, UserAccount};
use crate::value::CellValue;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

pub const ADULT_MALE: &str = "adultMale";
pub const ADULT_FEMALE: &str = "adultFemale";
pub const ADULT_TOTAL: &str = "adultTotal";
pub const TEEN_MALE: &str = "teenMale";
pub const TEEN_FEMALE: &str = "teenFemale";
pub const TEEN_TOTAL: &str = "teenTotal";
pub const CHILD_MALE: &str = "childMale";
pub const CHILD_FEMALE: &str = "childFemale";
pub const CHILD_TOTAL: &str = "childTotal";
pub const MALE_TOTAL: &str = "maleTotal";
pub const FEMALE_TOTAL: &str = "femaleTotal";
pub const GRAND_TOTAL: &str = "grandTotal";
pub const ASSIGNEE_NAME: &str = "assigneeName";
pub const UPDATED_AT: &str = "updatedAt";
pub const ID: &str = "id";

/// A row that can flow through the filter → order → summarize pipeline.
pub trait ReportRow: Clone {
    /// Stable identity. Never the display index.
    fn row_id(&self) -> &str;

    /// Value of a column, `Null` when the row has no such column.
    fn cell(&self, column: &str) -> CellValue;

    fn display_index(&self) -> Option<usize>;

    fn set_display_index(&mut self, index: usize);

    /// Pinned rows order before all others regardless of sort state.
    fn pinned(&self) -> bool {
        false
    }

    /// JSON object with the row id and the given columns.
    fn to_json(&self, columns: &[&str]) -> JsonValue {
        let mut obj = Map::new();
        obj.insert(ID.to_string(), JsonValue::String(self.row_id().to_string()));
        for column in columns {
            obj.insert(column.to_string(), self.cell(column).to_json());
        }
        JsonValue::Object(obj)
    }
}

/// One raw record flattened for display and totals.
///
/// Derived columns shadow overview fields with the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub id: String,
    pub overview: BTreeMap<String, CellValue>,
    pub attendance: Attendance,
    /// Budget subtotal per configured bucket column
    pub budget: BTreeMap<String, i64>,
    pub assignee_name: String,
    pub updated_at: String,
    pub display_index: Option<usize>,
}

impl DerivedRow {
    fn attendance_cell(&self, column: &str) -> Option<i64> {
        let a = &self.attendance;
        let value = match column {
            ADULT_MALE => a.adult_male,
            ADULT_FEMALE => a.adult_female,
            ADULT_TOTAL => a.adult_total(),
            TEEN_MALE => a.teen_male,
            TEEN_FEMALE => a.teen_female,
            TEEN_TOTAL => a.teen_total(),
            CHILD_MALE => a.child_male,
            CHILD_FEMALE => a.child_female,
            CHILD_TOTAL => a.child_total(),
            MALE_TOTAL => a.male_total(),
            FEMALE_TOTAL => a.female_total(),
            GRAND_TOTAL => a.grand_total(),
            _ => return None,
        };
        Some(value)
    }
}

impl ReportRow for DerivedRow {
    fn row_id(&self) -> &str {
        &self.id
    }

    fn cell(&self, column: &str) -> CellValue {
        if let Some(v) = self.attendance_cell(column) {
            return CellValue::Int(v);
        }
        if let Some(v) = self.budget.get(column) {
            return CellValue::Int(*v);
        }
        match column {
            INDEX_COLUMN => self
                .display_index
                .map(|i| CellValue::Int(i as i64))
                .unwrap_or(CellValue::Null),
            ID => CellValue::Text(self.id.clone()),
            ASSIGNEE_NAME => CellValue::Text(self.assignee_name.clone()),
            UPDATED_AT => CellValue::Text(self.updated_at.clone()),
            _ => self.overview.get(column).cloned().unwrap_or(CellValue::Null),
        }
    }

    fn display_index(&self) -> Option<usize> {
        self.display_index
    }

    fn set_display_index(&mut self, index: usize) {
        self.display_index = Some(index);
    }
}

pub const ADMIN_LIBRARY_LABEL: &str = "도서관 관리자";
pub const ADMIN_NAME: &str = "admin";
pub const STATUS_APPROVED: &str = "승인됨";
pub const STATUS_PENDING: &str = "대기중";
pub const ROLE_ADMIN: &str = "대표";
pub const ROLE_SPECIAL: &str = "특별";
pub const ROLE_GENERAL: &str = "일반";

/// One account projected for the user management screen.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub library_name: String,
    pub name: String,
    pub status: String,
    pub role: String,
    pub created_at: String,
    pub is_admin: bool,
    pub display_index: Option<usize>,
}

impl UserRow {
    pub fn from_account(account: &UserAccount, utc_offset_minutes: i32) -> Self {
        let created_at = account
            .created_at
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| format_timestamp(s, utc_offset_minutes))
            .unwrap_or_else(|| "-".to_string());

        if account.is_admin {
            return UserRow {
                id: account.id.clone(),
                library_name: ADMIN_LIBRARY_LABEL.to_string(),
                name: ADMIN_NAME.to_string(),
                status: STATUS_APPROVED.to_string(),
                role: ROLE_ADMIN.to_string(),
                created_at,
                is_admin: true,
                display_index: None,
            };
        }

        let role = match account.role.as_deref() {
            Some("special") => ROLE_SPECIAL,
            _ => ROLE_GENERAL,
        };
        UserRow {
            id: account.id.clone(),
            library_name: account.library_name.clone().unwrap_or_default(),
            name: account.name.clone(),
            status: if account.is_approved { STATUS_APPROVED } else { STATUS_PENDING }.to_string(),
            role: role.to_string(),
            created_at,
            is_admin: false,
            display_index: None,
        }
    }
}

impl ReportRow for UserRow {
    fn row_id(&self) -> &str {
        &self.id
    }

    fn cell(&self, column: &str) -> CellValue {
        let text = match column {
            "libraryName" => &self.library_name,
            "name" => &self.name,
            "status" => &self.status,
            "role" => &self.role,
            "createdAt" => &self.created_at,
            ID => &self.id,
            INDEX_COLUMN => {
                return self
                    .display_index
                    .map(|i| CellValue::Int(i as i64))
                    .unwrap_or(CellValue::Null)
            }
            _ => return CellValue::Null,
        };
        CellValue::Text(text.clone())
    }

    fn display_index(&self) -> Option<usize> {
        self.display_index
    }

    fn set_display_index(&mut self, index: usize) {
        self.display_index = Some(index);
    }

    fn pinned(&self) -> bool {
        self.is_admin
    }
}

/// Render a stored timestamp as `YYYY-MM-DD HH:MM` in the given UTC offset.
///
/// Timestamps without an offset are taken as UTC, and so is an offset
/// outside ±24 hours. Text that is not a timestamp is returned unchanged.
pub fn format_timestamp(raw: &str, utc_offset_minutes: i32) -> String {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string();
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return naive
                .and_utc()
                .with_timezone(&offset)
                .format("%Y-%m-%d %H:%M")
                .to_string();
        }
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> DerivedRow {
        let mut overview = BTreeMap::new();
        overview.insert("title".to_string(), CellValue::Text("동화 읽기".into()));
        overview.insert("grandTotal".to_string(), CellValue::Int(-1));
        let mut budget = BTreeMap::new();
        budget.insert("amt21001".to_string(), 5000);
        DerivedRow {
            id: "r1".to_string(),
            overview,
            attendance: Attendance {
                adult_male: 1,
                adult_female: 2,
                teen_male: 0,
                teen_female: 0,
                child_male: 3,
                child_female: 4,
            },
            budget,
            assignee_name: "홍길동".to_string(),
            updated_at: "2025-01-01 09:00".to_string(),
            display_index: None,
        }
    }

    #[test]
    fn test_derived_row_cells() {
        let row = sample_row();
        assert_eq!(row.cell("title"), CellValue::Text("동화 읽기".into()));
        assert_eq!(row.cell("adultTotal"), CellValue::Int(3));
        assert_eq!(row.cell("childTotal"), CellValue::Int(7));
        assert_eq!(row.cell("amt21001"), CellValue::Int(5000));
        assert_eq!(row.cell("assigneeName"), CellValue::Text("홍길동".into()));
        assert_eq!(row.cell("missing"), CellValue::Null);
        assert_eq!(row.cell(INDEX_COLUMN), CellValue::Null);
    }

    #[test]
    fn test_derived_columns_shadow_overview() {
        let row = sample_row();
        assert_eq!(row.cell("grandTotal"), CellValue::Int(10));
    }

    #[test]
    fn test_display_index_slot() {
        let mut row = sample_row();
        row.set_display_index(3);
        assert_eq!(row.display_index(), Some(3));
        assert_eq!(row.cell(INDEX_COLUMN), CellValue::Int(3));
    }

    #[test]
    fn test_row_to_json() {
        let row = sample_row();
        let json = row.to_json(&["title", "grandTotal"]);
        assert_eq!(json["id"], "r1");
        assert_eq!(json["title"], "동화 읽기");
        assert_eq!(json["grandTotal"], 10);
    }

    #[test]
    fn test_user_row_projection() {
        let admin = UserAccount {
            id: "1".into(),
            name: "root".into(),
            is_admin: true,
            ..Default::default()
        };
        let row = UserRow::from_account(&admin, 540);
        assert!(row.pinned());
        assert_eq!(row.cell("libraryName"), CellValue::Text(ADMIN_LIBRARY_LABEL.into()));
        assert_eq!(row.cell("role"), CellValue::Text(ROLE_ADMIN.into()));
        assert_eq!(row.cell("createdAt"), CellValue::Text("-".into()));

        let pending = UserAccount {
            id: "2".into(),
            name: "김사서".into(),
            library_name: Some("대구광역시립동부도서관".into()),
            role: Some("special".into()),
            created_at: Some("2025-02-01T00:30:00Z".into()),
            ..Default::default()
        };
        let row = UserRow::from_account(&pending, 540);
        assert!(!row.pinned());
        assert_eq!(row.cell("status"), CellValue::Text(STATUS_PENDING.into()));
        assert_eq!(row.cell("role"), CellValue::Text(ROLE_SPECIAL.into()));
        assert_eq!(row.cell("createdAt"), CellValue::Text("2025-02-01 09:30".into()));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2025-03-05T01:02:03Z", 0), "2025-03-05 01:02");
        assert_eq!(format_timestamp("2025-03-05T20:15:00+00:00", 540), "2025-03-06 05:15");
        assert_eq!(format_timestamp("2025-03-05T01:02:03.123456", 540), "2025-03-05 10:02");
        assert_eq!(format_timestamp("2025-03-05 01:02:03", 0), "2025-03-05 01:02");
        assert_eq!(format_timestamp("yesterday", 540), "yesterday");
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        assert_eq!(format_timestamp("2025-03-05T01:02:03Z", i32::MAX), "2025-03-05 01:02");
        assert_eq!(format_timestamp("2025-03-05T01:02:03Z", -2000), "2025-03-05 01:02");
    }
}
