//! Remote record store over a hosted document collection.
//!
//! # Responsibility
//! - Map activity records to and from collection documents.
//! - Delegate transport to an injected [`DocumentClient`] handle.
//!
//! # Invariants
//! - Document ids are assigned by the collection, never by this store.
//! - Each store operation is exactly one client call.
//! - Documents with malformed dates or ages are rejected.
//! - Unrecognized categories load as `Category::Unknown` and are written back
//!   unchanged.

pub mod firestore;

use crate::model::activity::{parse_date, ActivityFields, ActivityRecord, Category, RecordId};
use crate::store::{RecordStore, StoreError, StoreResult};
use log::{error, info};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "activities";

/// Document fields keyed by field name, each holding a typed value wrapper
/// (`{"stringValue": ...}`, `{"integerValue": ...}`, `{"nullValue": null}`).
pub type DocumentFields = Map<String, Value>;

/// One document read from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: DocumentFields,
}

/// Handle to a hosted document database.
///
/// Injected into [`RemoteRecordStore`] so tests can substitute a double.
pub trait DocumentClient {
    fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>>;
    /// Creates a document and returns its generated id.
    fn create_document(&self, collection: &str, fields: &DocumentFields) -> StoreResult<String>;
    /// Replaces all fields of an existing document.
    fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: &DocumentFields,
    ) -> StoreResult<()>;
    fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;
}

impl<C: DocumentClient + ?Sized> DocumentClient for Arc<C> {
    fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        (**self).list_documents(collection)
    }

    fn create_document(&self, collection: &str, fields: &DocumentFields) -> StoreResult<String> {
        (**self).create_document(collection, fields)
    }

    fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: &DocumentFields,
    ) -> StoreResult<()> {
        (**self).update_document(collection, id, fields)
    }

    fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete_document(collection, id)
    }
}

/// Record store backed by one named document collection.
pub struct RemoteRecordStore<C: DocumentClient> {
    client: C,
    collection: String,
}

impl<C: DocumentClient> RemoteRecordStore<C> {
    pub fn new(client: C) -> Self {
        Self::with_collection(client, DEFAULT_COLLECTION)
    }

    pub fn with_collection(client: C, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn observe<T>(&self, event: &str, call: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
        let started_at = Instant::now();
        let result = call();
        match &result {
            Ok(_) => info!(
                "event={} module=store status=ok store=remote collection={} duration_ms={}",
                event,
                self.collection,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={} module=store status=error store=remote collection={} duration_ms={} error={}",
                event,
                self.collection,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

impl<C: DocumentClient> RecordStore for RemoteRecordStore<C> {
    fn kind(&self) -> &'static str {
        "remote"
    }

    fn list(&self) -> StoreResult<Vec<ActivityRecord>> {
        self.observe("record_list", || {
            self.client
                .list_documents(&self.collection)?
                .iter()
                .map(decode_document)
                .collect()
        })
    }

    fn create(&self, fields: &ActivityFields) -> StoreResult<RecordId> {
        self.observe("record_create", || {
            let id = self
                .client
                .create_document(&self.collection, &encode_fields(fields))?;
            Ok(RecordId::new(id))
        })
    }

    fn update(&self, id: &RecordId, fields: &ActivityFields) -> StoreResult<()> {
        self.observe("record_update", || {
            self.client
                .update_document(&self.collection, id.as_str(), &encode_fields(fields))
        })
    }

    fn delete(&self, id: &RecordId) -> StoreResult<()> {
        self.observe("record_delete", || {
            self.client.delete_document(&self.collection, id.as_str())
        })
    }
}

/// Encodes record fields as typed document values.
///
/// Dates are stored as `YYYY-MM-DD` strings and absent values as nulls.
pub fn encode_fields(fields: &ActivityFields) -> DocumentFields {
    let mut encoded = Map::new();
    encoded.insert("name".into(), string_value(&fields.name));
    encoded.insert(
        "birth_date".into(),
        fields
            .birth_date
            .map_or_else(null_value, |date| string_value(&date.to_string())),
    );
    encoded.insert(
        "age".into(),
        fields
            .age
            .map_or_else(null_value, |age| json!({ "integerValue": age.to_string() })),
    );
    encoded.insert("email".into(), string_value(&fields.email));
    encoded.insert("phone".into(), string_value(&fields.phone));
    encoded.insert("address".into(), string_value(&fields.address));
    encoded.insert(
        "activity_date".into(),
        fields
            .activity_date
            .map_or_else(null_value, |date| string_value(&date.to_string())),
    );
    encoded.insert("category".into(), string_value(fields.category.as_str()));
    encoded.insert("description".into(), string_value(&fields.description));
    encoded
}

/// Decodes one document into a record.
///
/// Missing fields read as empty. A missing category reads as the default.
pub fn decode_document(document: &Document) -> StoreResult<ActivityRecord> {
    let fields = &document.fields;
    let context = |field: &str, detail: &str| {
        StoreError::InvalidData(format!(
            "document `{}` field `{field}`: {detail}",
            document.id
        ))
    };

    let date_field = |field: &str| -> StoreResult<_> {
        match read_scalar(fields, field) {
            Some(raw) if !raw.is_empty() => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| context(field, &format!("invalid date `{raw}`"))),
            _ => Ok(None),
        }
    };

    let age = match read_scalar(fields, "age") {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<i32>()
                .map_err(|_| context("age", &format!("invalid integer `{raw}`")))?,
        ),
        _ => None,
    };

    let category = read_scalar(fields, "category")
        .map(|raw| Category::from_stored(&raw))
        .unwrap_or_default();

    Ok(ActivityRecord::new(
        RecordId::new(document.id.clone()),
        ActivityFields {
            name: read_scalar(fields, "name").unwrap_or_default(),
            birth_date: date_field("birth_date")?,
            age,
            email: read_scalar(fields, "email").unwrap_or_default(),
            phone: read_scalar(fields, "phone").unwrap_or_default(),
            address: read_scalar(fields, "address").unwrap_or_default(),
            activity_date: date_field("activity_date")?,
            category,
            description: read_scalar(fields, "description").unwrap_or_default(),
        },
    ))
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn null_value() -> Value {
    json!({ "nullValue": null })
}

/// Reads a scalar wrapper as text. `integerValue` may arrive as a JSON string
/// or number; `nullValue` reads as absent.
fn read_scalar(fields: &DocumentFields, name: &str) -> Option<String> {
    let wrapper = fields.get(name)?.as_object()?;
    if let Some(value) = wrapper.get("stringValue") {
        return value.as_str().map(str::to_string);
    }
    match wrapper.get("integerValue")? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
