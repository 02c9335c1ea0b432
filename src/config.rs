/// Report configuration
///
/// Loaded from JSON; every field is optional.
///
/// ```json
/// {
///   "year": "2025",
///   "organization": "대구광역시립동부도서관",
///   "categoryListKey": "구분",
///   "budgetListKey": "예산",
///   "aggregation": {"unknownAssignee": "Unknown", "utcOffsetMinutes": 540},
///   "libraryOrder": ["국채보상운동기념도서관", "..."]
/// }
/// ```
///
/// `REPORT_YEAR` and `REPORT_ORGANIZATION` override the scope fields when
/// [`ReportConfig::apply_env_overrides`] is called.

use crate::aggregate::AggregationConfig;
use crate::columns::ReportLayout;
use crate::error::{ReportError, Result};
use crate::source::Scope;
use crate::stats::StatGroup;
use crate::value::json_scalar_text;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

pub const YEAR_ENV: &str = "REPORT_YEAR";
pub const ORGANIZATION_ENV: &str = "REPORT_ORGANIZATION";

/// Libraries in their customary listing order.
pub const DEFAULT_LIBRARY_ORDER: [&str; 10] = [
    "국채보상운동기념도서관",
    "대구2·28기념학생도서관",
    "대구광역시립동부도서관",
    "대구광역시립서부도서관",
    "대구광역시립남부도서관",
    "대구광역시립북부도서관",
    "대구광역시립수성도서관",
    "대구광역시립두류도서관",
    "대구광역시립달성도서관",
    "대구광역시교육청 삼국유사군위도서관",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    #[serde(deserialize_with = "de_opt_text")]
    pub year: Option<String>,
    #[serde(deserialize_with = "de_opt_text")]
    pub organization: Option<String>,
    /// Master list holding the category order
    pub category_list_key: String,
    /// Master list holding the budget lines
    pub budget_list_key: String,
    pub aggregation: AggregationConfig,
    /// Status screen layout, the built-in one when unset
    pub layout: Option<ReportLayout>,
    pub library_order: Vec<String>,
    pub stat_groups: Vec<StatGroup>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            year: None,
            organization: None,
            category_list_key: "구분".to_string(),
            budget_list_key: "예산".to_string(),
            aggregation: AggregationConfig::default(),
            layout: None,
            library_order: DEFAULT_LIBRARY_ORDER.iter().map(|s| s.to_string()).collect(),
            stat_groups: StatGroup::defaults(),
        }
    }
}

fn de_opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value
        .map(|v| json_scalar_text(&v).trim().to_string())
        .filter(|s| !s.is_empty()))
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(layout) = &self.layout {
            layout.validate()?;
        }
        if self.category_list_key.trim().is_empty() || self.budget_list_key.trim().is_empty() {
            return Err(ReportError::Config("master list keys must not be empty".to_string()));
        }
        if self.aggregation.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(ReportError::Config(format!(
                "utcOffsetMinutes {} is outside ±24 hours",
                self.aggregation.utc_offset_minutes
            )));
        }
        let mut columns = std::collections::HashSet::new();
        for bucket in &self.aggregation.budget_buckets {
            if !columns.insert(bucket.column.as_str()) {
                return Err(ReportError::Config(format!(
                    "budget column '{}' is used by more than one code",
                    bucket.column
                )));
            }
        }
        Ok(())
    }

    /// Override the scope from `REPORT_YEAR` / `REPORT_ORGANIZATION`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override the scope from any variable lookup. Blank values are
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(year) = read(YEAR_ENV) {
            self.year = Some(year);
        }
        if let Some(organization) = read(ORGANIZATION_ENV) {
            self.organization = Some(organization);
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.year.clone(), self.organization.clone())
    }

    pub fn layout(&self) -> ReportLayout {
        self.layout.clone().unwrap_or_else(ReportLayout::status)
    }

    /// Year as a number, for month statistics.
    pub fn year_number(&self) -> Option<i32> {
        self.year.as_deref().and_then(|y| y.trim().parse().ok())
    }
}
