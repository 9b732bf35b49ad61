//! Table projection of stored records.
//!
//! Rows are plain display strings so any front end can render them without
//! knowing the record types.

use crate::model::activity::ActivityRecord;
use chrono::NaiveDate;

pub const TABLE_HEADERS: [&str; 9] = [
    "Name",
    "Date of birth",
    "Age",
    "Email",
    "Phone",
    "Address",
    "Activity date",
    "Category",
    "Description",
];

/// One table row, keyed by the record it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub id: String,
    pub cells: [String; 9],
}

impl From<&ActivityRecord> for RecordRow {
    fn from(record: &ActivityRecord) -> Self {
        let fields = &record.fields;
        let date_cell = |date: Option<NaiveDate>| date.map(|d| d.to_string()).unwrap_or_default();
        Self {
            id: record.id.to_string(),
            cells: [
                fields.name.clone(),
                date_cell(fields.birth_date),
                fields.age.map(|age| age.to_string()).unwrap_or_default(),
                fields.email.clone(),
                fields.phone.clone(),
                fields.address.clone(),
                date_cell(fields.activity_date),
                fields.category.label().to_string(),
                fields.description.clone(),
            ],
        }
    }
}

/// Projects records into display rows, preserving order.
pub fn table_rows(records: &[ActivityRecord]) -> Vec<RecordRow> {
    records.iter().map(RecordRow::from).collect()
}
