/// Raw program records and user accounts
///
/// Records arrive as JSON documents from the record source. Parsing is
/// strict about *shape* and lenient about *values*: a record that is not an
/// object, has no id, or carries a non-array `performances` list is rejected
/// with [`ReportError::MalformedRecord`]; a count of `"abc"` is simply zero.
///
/// Field names follow the stored data, with the descriptive names accepted
/// too (`v5` / `classificationCode`, `opDate` / `operationDate`,
/// `adultM` / `adultMale`, ...).

use crate::error::{ReportError, Result};
use crate::value::{json_amount, json_scalar_text, CategoryLabel, CellValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};

/// Overview key holding the program category.
pub const CATEGORY_FIELD: &str = "category";

/// Attendance counts by age group and gender.
///
/// Totals and sums saturate at the `i64` bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub adult_male: i64,
    pub adult_female: i64,
    pub teen_male: i64,
    pub teen_female: i64,
    pub child_male: i64,
    pub child_female: i64,
}

impl Attendance {
    pub fn adult_total(&self) -> i64 {
        self.adult_male.saturating_add(self.adult_female)
    }

    pub fn teen_total(&self) -> i64 {
        self.teen_male.saturating_add(self.teen_female)
    }

    pub fn child_total(&self) -> i64 {
        self.child_male.saturating_add(self.child_female)
    }

    pub fn male_total(&self) -> i64 {
        self.adult_male.saturating_add(self.teen_male).saturating_add(self.child_male)
    }

    pub fn female_total(&self) -> i64 {
        self.adult_female.saturating_add(self.teen_female).saturating_add(self.child_female)
    }

    pub fn grand_total(&self) -> i64 {
        self.male_total().saturating_add(self.female_total())
    }

    /// Field-wise sum.
    pub fn add(&mut self, other: &Attendance) {
        self.adult_male = self.adult_male.saturating_add(other.adult_male);
        self.adult_female = self.adult_female.saturating_add(other.adult_female);
        self.teen_male = self.teen_male.saturating_add(other.teen_male);
        self.teen_female = self.teen_female.saturating_add(other.teen_female);
        self.child_male = self.child_male.saturating_add(other.child_male);
        self.child_female = self.child_female.saturating_add(other.child_female);
    }
}

/// One dated session of a program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Performance {
    pub operation_date: Option<String>,
    pub attendance: Attendance,
}

/// One budget allocation line on a record.
///
/// `path` holds the four budget hierarchy levels (`v1`..`v4`); the
/// classification code (`v5`) routes the amount into subtotal columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetItem {
    pub path: [String; 4],
    pub classification_code: String,
    pub amount: i64,
}

/// One program entry as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub id: String,
    pub overview: BTreeMap<String, CellValue>,
    pub budget_items: Vec<BudgetItem>,
    pub performances: Vec<Performance>,
    pub owner_user_id: Option<String>,
    pub updated_at: Option<String>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>) -> Self {
        RawRecord {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Overview value, `Null` when absent.
    pub fn overview_value(&self, key: &str) -> CellValue {
        self.overview.get(key).cloned().unwrap_or(CellValue::Null)
    }

    /// Overview value as display text, empty when absent.
    pub fn overview_text(&self, key: &str) -> String {
        self.overview
            .get(key)
            .map(|v| v.to_filter_string())
            .unwrap_or_default()
    }

    /// Category label, empty `Simple` label when absent.
    pub fn category(&self) -> CategoryLabel {
        match self.overview.get(CATEGORY_FIELD) {
            Some(CellValue::Category(label)) => label.clone(),
            Some(other) => CategoryLabel::Simple(other.to_filter_string()),
            None => CategoryLabel::Simple(String::new()),
        }
    }

    /// Parse one record. `index` is the record's position in its batch and
    /// is only used for error messages.
    pub fn from_json(index: usize, value: &JsonValue) -> Result<RawRecord> {
        let obj = value
            .as_object()
            .ok_or_else(|| ReportError::malformed(index, "record is not an object"))?;

        let id = match field(obj, &["id"]) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => return Err(ReportError::malformed(index, "missing or invalid 'id'")),
        };

        let overview = match field(obj, &["overview"]) {
            None => BTreeMap::new(),
            Some(JsonValue::Object(fields)) => parse_overview(index, fields)?,
            Some(_) => return Err(ReportError::malformed(index, "'overview' is not an object")),
        };

        let performances = object_list(index, obj, &["performances"], "performances")?
            .into_iter()
            .map(parse_performance)
            .collect();

        let budget_items = object_list(index, obj, &["budgetItems", "budget"], "budgetItems")?
            .into_iter()
            .map(parse_budget_item)
            .collect();

        let owner_user_id = field(obj, &["ownerUserId", "userId", "user_id"])
            .map(json_scalar_text)
            .filter(|s| !s.is_empty());

        let updated_at = field(obj, &["updatedAt", "updated_at"])
            .map(json_scalar_text)
            .filter(|s| !s.is_empty());

        Ok(RawRecord {
            id,
            overview,
            budget_items,
            performances,
            owner_user_id,
            updated_at,
        })
    }

    /// Parse a batch, failing on the first malformed record.
    pub fn parse_all(values: &[JsonValue]) -> Result<Vec<RawRecord>> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| RawRecord::from_json(i, v))
            .collect()
    }
}

/// First present, non-null field among `names`.
fn field<'a>(obj: &'a Map<String, JsonValue>, names: &[&str]) -> Option<&'a JsonValue> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

fn object_list<'a>(
    index: usize,
    obj: &'a Map<String, JsonValue>,
    names: &[&str],
    label: &str,
) -> Result<Vec<&'a Map<String, JsonValue>>> {
    match field(obj, names) {
        None => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(pos, item)| {
                item.as_object().ok_or_else(|| {
                    ReportError::malformed(index, format!("'{}'[{}] is not an object", label, pos))
                })
            })
            .collect(),
        Some(_) => Err(ReportError::malformed(index, format!("'{}' is not an array", label))),
    }
}

fn parse_overview(index: usize, fields: &Map<String, JsonValue>) -> Result<BTreeMap<String, CellValue>> {
    let mut overview = BTreeMap::new();
    for (key, raw) in fields {
        let value = if key == CATEGORY_FIELD {
            match raw {
                JsonValue::Null => CellValue::Null,
                JsonValue::Number(_) | JsonValue::Bool(_) => {
                    CellValue::Category(CategoryLabel::Simple(json_scalar_text(raw)))
                }
                _ => CategoryLabel::from_json(raw).map(CellValue::Category).ok_or_else(|| {
                    ReportError::malformed(index, "overview 'category' is neither a label nor a v1/v2/v3 triple")
                })?,
            }
        } else {
            CellValue::from_json(raw).ok_or_else(|| {
                ReportError::malformed(index, format!("overview field '{}' is not a scalar", key))
            })?
        };
        overview.insert(key.clone(), value);
    }
    Ok(overview)
}

fn count(obj: &Map<String, JsonValue>, names: &[&str]) -> i64 {
    field(obj, names).map(json_amount).unwrap_or(0)
}

fn parse_performance(obj: &Map<String, JsonValue>) -> Performance {
    Performance {
        operation_date: field(obj, &["operationDate", "opDate"])
            .map(json_scalar_text)
            .filter(|s| !s.trim().is_empty()),
        attendance: Attendance {
            adult_male: count(obj, &["adultMale", "adultM"]),
            adult_female: count(obj, &["adultFemale", "adultF"]),
            teen_male: count(obj, &["teenMale", "teenM"]),
            teen_female: count(obj, &["teenFemale", "teenF"]),
            child_male: count(obj, &["childMale", "childM"]),
            child_female: count(obj, &["childFemale", "childF"]),
        },
    }
}

fn parse_budget_item(obj: &Map<String, JsonValue>) -> BudgetItem {
    let text = |names: &[&str]| field(obj, names).map(json_scalar_text).unwrap_or_default();
    BudgetItem {
        path: [text(&["v1"]), text(&["v2"]), text(&["v3"]), text(&["v4"])],
        classification_code: text(&["classificationCode", "v5"]),
        amount: count(obj, &["amount"]),
    }
}

/// A user account as stored by the account service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub name: String,
    #[serde(default, alias = "library_name")]
    pub library_name: Option<String>,
    #[serde(default, alias = "is_admin", deserialize_with = "de_flag")]
    pub is_admin: bool,
    #[serde(default, alias = "is_approved", deserialize_with = "de_flag")]
    pub is_approved: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid user id: {}", other))),
    }
}

fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(json_scalar_text(&JsonValue::deserialize(deserializer)?))
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Owner id → display name lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDirectory {
    names: HashMap<String, String>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn from_accounts(accounts: &[UserAccount]) -> Self {
        accounts
            .iter()
            .map(|a| (a.id.clone(), a.name.clone()))
            .collect()
    }
}

impl FromIterator<(String, String)> for UserDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        UserDirectory {
            names: iter.into_iter().collect(),
        }
    }
}
