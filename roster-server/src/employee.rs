//! Employee records and their stored-document normalization.

use bson::{Bson, Document as BsonDocument};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use roster_core::{
    document::Document,
    error::{StoreError, StoreResult},
};

/// A stored employee record, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Storage-assigned opaque id, immutable across updates.
    pub id: String,
    /// Externally supplied unique identifier, e.g. "EMP001".
    pub employee_id: String,
    pub name: String,
    pub age: i32,
    pub department: String,
    pub salary: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joining_date: Option<NaiveDate>,
    pub skills: Vec<String>,
}

/// A candidate record for insertion. The storage id does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub employee_id: String,
    pub name: String,
    pub age: i32,
    pub department: String,
    pub salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joining_date: Option<NaiveDate>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A sparse update: `None` means "leave unchanged".
///
/// A field sent as JSON `null` deserializes to `None` and is therefore
/// indistinguishable from an omitted field; both are dropped from the update
/// set. There is no way to clear a field through this type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    pub joining_date: Option<NaiveDate>,
    pub skills: Option<Vec<String>>,
}

impl EmployeeUpdate {
    /// Collapses the update into the set of fields explicitly provided.
    pub fn into_document(self) -> BsonDocument {
        let mut fields = BsonDocument::new();

        if let Some(name) = self.name {
            fields.insert("name", name);
        }
        if let Some(age) = self.age {
            fields.insert("age", age);
        }
        if let Some(department) = self.department {
            fields.insert("department", department);
        }
        if let Some(salary) = self.salary {
            fields.insert("salary", salary);
        }
        if let Some(date) = self.joining_date {
            fields.insert("joining_date", date.format("%Y-%m-%d").to_string());
        }
        if let Some(skills) = self.skills {
            fields.insert(
                "skills",
                skills
                    .into_iter()
                    .map(Bson::String)
                    .collect::<Vec<_>>(),
            );
        }

        fields
    }
}

/// One bucket of the salary aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentAverage {
    pub department: String,
    pub avg_salary: f64,
}

/// Coerces a stored `joining_date` value to a calendar date.
///
/// Depending on which client wrote the record, the field may hold a BSON
/// datetime, a plain `YYYY-MM-DD` string, or a full ISO-8601 string. Strict
/// date parsing is tried first, then the general ISO forms; anything else
/// degrades to absent rather than failing the read.
pub fn coerce_joining_date(value: Option<&Bson>) -> Option<NaiveDate> {
    match value? {
        Bson::DateTime(dt) => Some(dt.to_chrono().date_naive()),
        Bson::String(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                raw.parse::<DateTime<FixedOffset>>()
                    .ok()
                    .map(|dt| dt.date_naive())
            })
            .or_else(|| {
                raw.parse::<NaiveDateTime>()
                    .ok()
                    .map(|dt| dt.date())
            }),
        _ => None,
    }
}

impl Document for Employee {
    fn collection_name() -> &'static str {
        "employees"
    }

    fn from_stored(document: BsonDocument) -> StoreResult<Self> {
        Ok(Employee {
            id: read_string(&document, "id")?,
            employee_id: read_string(&document, "employee_id")?,
            name: read_string(&document, "name")?,
            age: read_integer(&document, "age")?,
            department: read_string(&document, "department")?,
            salary: read_number(&document, "salary")?,
            joining_date: coerce_joining_date(document.get("joining_date")),
            skills: read_skills(&document),
        })
    }
}

fn read_string(document: &BsonDocument, field: &str) -> StoreResult<String> {
    match document.get(field) {
        Some(Bson::String(value)) => Ok(value.clone()),
        _ => Err(StoreError::InvalidDocument(format!(
            "missing or non-string field {field}"
        ))),
    }
}

fn read_integer(document: &BsonDocument, field: &str) -> StoreResult<i32> {
    match document.get(field) {
        Some(Bson::Int32(value)) => Ok(*value),
        Some(Bson::Int64(value)) => Ok(*value as i32),
        Some(Bson::Double(value)) => Ok(*value as i32),
        _ => Err(StoreError::InvalidDocument(format!(
            "missing or non-integer field {field}"
        ))),
    }
}

fn read_number(document: &BsonDocument, field: &str) -> StoreResult<f64> {
    match document.get(field) {
        Some(Bson::Double(value)) => Ok(*value),
        Some(Bson::Int32(value)) => Ok(*value as f64),
        Some(Bson::Int64(value)) => Ok(*value as f64),
        _ => Err(StoreError::InvalidDocument(format!(
            "missing or non-numeric field {field}"
        ))),
    }
}

fn read_skills(document: &BsonDocument) -> Vec<String> {
    match document.get("skills") {
        Some(Bson::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Bson::String(skill) => Some(skill.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
