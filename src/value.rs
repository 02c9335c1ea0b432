/// Cell values for report rows
///
/// A `CellValue` is one scalar field of a row as the report sees it. Raw
/// records carry free-form overview fields (strings, numbers, the odd
/// boolean) plus a category that is either a plain label or a structured
/// three-level triple. Everything downstream (filters, ordering, totals)
/// works through the two coercions defined here:
///
/// - [`CellValue::to_filter_string`] for display, search and value sets
/// - [`CellValue::to_amount`] for sums, which never fails
///
/// # Examples
///
/// ```
/// use program_report::{CategoryLabel, CellValue};
///
/// let label = CategoryLabel::hierarchical("교육", "강좌", "성인");
/// assert_eq!(label.to_display_label(), "교육 > 강좌 > 성인");
///
/// assert_eq!(CellValue::Text("1,200".into()).to_amount(), 1200);
/// assert_eq!(CellValue::Text("n/a".into()).to_amount(), 0);
/// assert_eq!(CellValue::Float(3.0).to_filter_string(), "3");
/// ```

use serde_json::Value as JsonValue;
use std::fmt;

/// A category label. Older records store a plain string, newer ones a
/// `{v1, v2, v3}` triple; both are compared through the display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryLabel {
    Simple(String),
    Hierarchical {
        major: String,
        middle: String,
        minor: String,
    },
}

impl CategoryLabel {
    pub fn simple(label: impl Into<String>) -> Self {
        CategoryLabel::Simple(label.into())
    }

    pub fn hierarchical(
        major: impl Into<String>,
        middle: impl Into<String>,
        minor: impl Into<String>,
    ) -> Self {
        CategoryLabel::Hierarchical {
            major: major.into(),
            middle: middle.into(),
            minor: minor.into(),
        }
    }

    /// The single projection used for every comparison, join and lookup.
    pub fn to_display_label(&self) -> String {
        match self {
            CategoryLabel::Simple(s) => s.clone(),
            CategoryLabel::Hierarchical { major, middle, minor } => {
                format!("{} > {} > {}", major, middle, minor)
            }
        }
    }

    /// Parse a label from its stored JSON form.
    ///
    /// Strings become `Simple`, objects with a `v1` key become `Hierarchical`.
    /// Anything else is not a category.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(s) => Some(CategoryLabel::Simple(s.clone())),
            JsonValue::Object(obj) if obj.contains_key("v1") => {
                let part = |key: &str| obj.get(key).map(json_scalar_text).unwrap_or_default();
                Some(CategoryLabel::Hierarchical {
                    major: part("v1"),
                    middle: part("v2"),
                    minor: part("v3"),
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_label())
    }
}

/// One scalar cell of a report row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Category(CategoryLabel),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view used by ordering. Only real numbers qualify; numeric
    /// text is still text when sorting.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String coercion shared by search, value sets and display.
    pub fn to_filter_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(v) => v.to_string(),
            CellValue::Float(v) => format_float(*v),
            CellValue::Text(s) => s.clone(),
            CellValue::Category(label) => label.to_display_label(),
        }
    }

    /// Integer coercion used by totals. Missing or non-numeric is zero.
    pub fn to_amount(&self) -> i64 {
        match self {
            CellValue::Int(v) => *v,
            CellValue::Float(v) => truncate_float(*v),
            CellValue::Text(s) => parse_amount(s),
            _ => 0,
        }
    }

    /// Convert an overview field from its stored JSON form.
    ///
    /// Returns `None` for arrays and for objects that are not category
    /// triples; callers treat that as a malformed shape.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(CellValue::Null),
            JsonValue::Bool(b) => Some(CellValue::Bool(*b)),
            JsonValue::Number(n) => Some(match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(0.0)),
            }),
            JsonValue::String(s) => Some(CellValue::Text(s.clone())),
            JsonValue::Object(_) => CategoryLabel::from_json(value).map(CellValue::Category),
            JsonValue::Array(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Null => JsonValue::Null,
            CellValue::Bool(b) => JsonValue::Bool(*b),
            CellValue::Int(v) => JsonValue::Number((*v).into()),
            CellValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Text(s) => JsonValue::String(s.clone()),
            CellValue::Category(label) => JsonValue::String(label.to_display_label()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

/// Lenient integer parse: trims, drops thousands separators, truncates
/// fractions. Anything unparsable is zero.
pub fn parse_amount(text: &str) -> i64 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return 0;
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return v;
    }
    cleaned.parse::<f64>().map(truncate_float).unwrap_or(0)
}

/// Lenient integer coercion of a raw JSON value.
pub fn json_amount(value: &JsonValue) -> i64 {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map(truncate_float).unwrap_or(0)),
        JsonValue::String(s) => parse_amount(s),
        _ => 0,
    }
}

/// Text of a scalar JSON value; null and containers become empty.
pub fn json_scalar_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn truncate_float(v: f64) -> i64 {
    if v.is_finite() {
        v.trunc() as i64
    } else {
        0
    }
}

fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
