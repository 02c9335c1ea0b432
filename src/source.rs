/// Record sources
///
/// [`RecordSource`] is the boundary to wherever program records, accounts
/// and master lists are stored. The report engine only reads through it.
///
/// [`Snapshot`] is an in-memory source loaded from a backup document:
///
/// ```json
/// {
///   "users": [{"id": "u1", "name": "김사서", "libraryName": "...", "isAdmin": false}],
///   "categories": [{"key": "2025_구분", "items": ["평생교육강좌", "독서문화행사"]}],
///   "entries": [{"id": "p1", "userId": "u1", "overview": {...}, "budgetItems": [...], "performances": [...]}]
/// }
/// ```
///
/// Master lists are partitioned by key prefix: `"{organization}_{year}_{key}"`
/// when both are scoped, `"{year}_{key}"` for a year alone, and the bare key
/// otherwise.

use crate::error::{ReportError, Result};
use crate::record::{RawRecord, UserAccount, UserDirectory};
use crate::value::CategoryLabel;
use log::debug;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

/// Overview field holding the record's report year.
pub const YEAR_FIELD: &str = "year";
/// Overview field holding the owning organization.
pub const ORGANIZATION_FIELD: &str = "libraryName";
const START_DATE_FIELD: &str = "startDate";

/// Partition of the stored data a report reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub year: Option<String>,
    pub organization: Option<String>,
}

impl Scope {
    pub fn new(year: Option<String>, organization: Option<String>) -> Self {
        Scope {
            year: year.filter(|y| !y.trim().is_empty()),
            organization: organization.filter(|o| !o.trim().is_empty()),
        }
    }

    pub fn year(year: impl Into<String>) -> Self {
        Self::new(Some(year.into()), None)
    }

    /// Whether a record belongs to this scope.
    ///
    /// A record with an overview year must match it exactly; one without
    /// falls back to its start date containing the year, and one with
    /// neither is out of any year scope.
    pub fn contains(&self, record: &RawRecord) -> bool {
        if let Some(year) = &self.year {
            let record_year = record.overview_text(YEAR_FIELD);
            let in_year = if !record_year.trim().is_empty() {
                record_year.trim() == year.trim()
            } else {
                let start_date = record.overview_text(START_DATE_FIELD);
                !start_date.is_empty() && start_date.contains(year.trim())
            };
            if !in_year {
                return false;
            }
        }
        match &self.organization {
            Some(organization) => record.overview_text(ORGANIZATION_FIELD) == *organization,
            None => true,
        }
    }

    /// Stored key of master list `key` under this scope, or `None` when a
    /// stored key does not belong to it.
    pub fn unprefix<'a>(&self, stored: &'a str) -> Option<&'a str> {
        match (&self.year, &self.organization) {
            (Some(year), Some(organization)) => stored.strip_prefix(&format!("{}_{}_", organization, year)),
            (Some(year), None) => stored.strip_prefix(&format!("{}_", year)),
            _ => (!stored.contains('_')).then_some(stored),
        }
    }
}

/// Read access to stored report data.
pub trait RecordSource {
    /// Program records in `scope`, in no particular order.
    fn fetch_records(&self, scope: &Scope) -> Result<Vec<RawRecord>>;

    fn fetch_users(&self) -> Result<Vec<UserAccount>>;

    /// Master list `key` (category list, budget lines, ...) for `scope`.
    /// A missing list is empty.
    fn fetch_master_list(&self, scope: &Scope, key: &str) -> Result<Vec<JsonValue>>;

    fn fetch_user_directory(&self) -> Result<UserDirectory> {
        Ok(UserDirectory::from_accounts(&self.fetch_users()?))
    }

    /// Ordered category labels. Entries that are neither strings nor
    /// category triples are skipped.
    fn fetch_category_order(&self, scope: &Scope, key: &str) -> Result<Vec<CategoryLabel>> {
        Ok(self
            .fetch_master_list(scope, key)?
            .iter()
            .filter_map(CategoryLabel::from_json)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct MasterList {
    key: String,
    #[serde(default)]
    items: Option<Vec<JsonValue>>,
}

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    users: Vec<UserAccount>,
    #[serde(default)]
    categories: Vec<MasterList>,
    #[serde(default)]
    entries: Vec<JsonValue>,
}

/// Read-only in-memory source built from a backup document.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    users: Vec<UserAccount>,
    lists: HashMap<String, Vec<JsonValue>>,
    records: Vec<RawRecord>,
}

impl Snapshot {
    pub fn new(users: Vec<UserAccount>, records: Vec<RawRecord>) -> Self {
        Snapshot {
            users,
            lists: HashMap::new(),
            records,
        }
    }

    /// Store a master list under its full stored key.
    pub fn insert_list(&mut self, stored_key: impl Into<String>, items: Vec<JsonValue>) {
        self.lists.insert(stored_key.into(), items);
    }

    pub fn from_value(value: JsonValue) -> Result<Self> {
        let document: SnapshotDocument = serde_json::from_value(value)?;
        let records = RawRecord::parse_all(&document.entries)?;

        let mut users = document.users;
        users.sort_by(|a, b| {
            (a.created_at.is_none(), &a.created_at).cmp(&(b.created_at.is_none(), &b.created_at))
        });

        let lists = document
            .categories
            .into_iter()
            .map(|list| (list.key, list.items.unwrap_or_default()))
            .collect();

        debug!("snapshot: {} users, {} records", users.len(), records.len());
        Ok(Snapshot {
            users,
            lists,
            records,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReportError::Source(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }
}

impl RecordSource for Snapshot {
    fn fetch_records(&self, scope: &Scope) -> Result<Vec<RawRecord>> {
        let records: Vec<RawRecord> = self
            .records
            .iter()
            .filter(|record| scope.contains(record))
            .cloned()
            .collect();
        debug!(
            "scope {:?}/{:?}: {} of {} records",
            scope.year,
            scope.organization,
            records.len(),
            self.records.len()
        );
        Ok(records)
    }

    fn fetch_users(&self) -> Result<Vec<UserAccount>> {
        Ok(self.users.clone())
    }

    fn fetch_master_list(&self, scope: &Scope, key: &str) -> Result<Vec<JsonValue>> {
        Ok(self
            .lists
            .iter()
            .find(|(stored, _)| scope.unprefix(stored) == Some(key))
            .map(|(_, items)| items.clone())
            .unwrap_or_default())
    }
}
