//! Local record store over a key-value storage.
//!
//! # Responsibility
//! - Keep the whole record list as one JSON array under a single key.
//! - Provide a SQLite-backed key-value storage for persistent use.
//!
//! # Invariants
//! - The full list is the unit of persistence: every mutation rewrites it.
//! - Records carry generated ids, so deleting one never shifts another's
//!   identity.
//! - A missing key reads as an empty list.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::activity::{ActivityFields, ActivityRecord, RecordId};
use crate::store::{RecordStore, StoreError, StoreResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "activity_records";

/// Minimal string key-value storage.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove_item(&self, key: &str) -> StoreResult<()>;
}

/// Key-value storage persisted in a SQLite `key_value` table.
pub struct SqliteKeyValueStorage {
    conn: Connection,
}

impl SqliteKeyValueStorage {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }
}

impl KeyValueStorage for SqliteKeyValueStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM key_value WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|source| key_error(key, source))?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO key_value (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![key, value],
            )
            .map_err(|source| key_error(key, source))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM key_value WHERE key = ?1;", [key])
            .map_err(|source| key_error(key, source))?;
        Ok(())
    }
}

fn key_error(key: &str, source: rusqlite::Error) -> StoreError {
    StoreError::Storage(DbError::Key {
        key: key.to_string(),
        source,
    })
}

/// Record store keeping the serialized list under one storage key.
pub struct LocalRecordStore<K: KeyValueStorage> {
    storage: K,
    key: String,
}

impl<K: KeyValueStorage> LocalRecordStore<K> {
    pub fn new(storage: K) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: K, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    /// Loads the full record list.
    pub fn load_all(&self) -> StoreResult<Vec<ActivityRecord>> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|err| {
            StoreError::InvalidData(format!(
                "storage key `{}` does not hold a record list: {err}",
                self.key
            ))
        })
    }

    /// Replaces the full record list.
    pub fn save_all(&self, records: &[ActivityRecord]) -> StoreResult<()> {
        let raw = serde_json::to_string(records).map_err(|err| {
            StoreError::InvalidData(format!("record list not serializable: {err}"))
        })?;
        self.storage.set_item(&self.key, &raw)
    }

    fn mutate<T>(
        &self,
        event: &str,
        apply: impl FnOnce(&mut Vec<ActivityRecord>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let result = self.load_all().and_then(|mut records| {
            let value = apply(&mut records)?;
            self.save_all(&records)?;
            Ok((value, records.len()))
        });

        match result {
            Ok((value, count)) => {
                info!("event={event} module=store status=ok store=local record_count={count}");
                Ok(value)
            }
            Err(err) => {
                error!("event={event} module=store status=error store=local error={err}");
                Err(err)
            }
        }
    }
}

impl<K: KeyValueStorage> RecordStore for LocalRecordStore<K> {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn list(&self) -> StoreResult<Vec<ActivityRecord>> {
        self.load_all()
    }

    fn create(&self, fields: &ActivityFields) -> StoreResult<RecordId> {
        self.mutate("record_create", |records| {
            let id = RecordId::generate();
            records.push(ActivityRecord::new(id.clone(), fields.clone()));
            Ok(id)
        })
    }

    fn update(&self, id: &RecordId, fields: &ActivityFields) -> StoreResult<()> {
        self.mutate("record_update", |records| {
            let record = records
                .iter_mut()
                .find(|record| &record.id == id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            record.fields = fields.clone();
            Ok(())
        })
    }

    fn delete(&self, id: &RecordId) -> StoreResult<()> {
        self.mutate("record_delete", |records| {
            let before = records.len();
            records.retain(|record| &record.id != id);
            if records.len() == before {
                return Err(StoreError::NotFound(id.clone()));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStorage, LocalRecordStore, SqliteKeyValueStorage};
    use crate::db::DbError;
    use crate::store::StoreError;

    #[test]
    fn key_value_storage_overwrites_and_removes() {
        let storage = SqliteKeyValueStorage::open_in_memory().unwrap();
        storage.set_item("k", "one").unwrap();
        storage.set_item("k", "two").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("two"));

        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let storage = SqliteKeyValueStorage::open_in_memory().unwrap();
        storage.set_item("activity_records", "{not json").unwrap();
        let store = LocalRecordStore::new(storage);

        match store.load_all() {
            Err(StoreError::InvalidData(message)) => assert!(message.contains("activity_records")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn storage_failures_name_the_key() {
        let storage = SqliteKeyValueStorage::open_in_memory().unwrap();
        storage.conn.execute_batch("DROP TABLE key_value;").unwrap();

        match storage.get_item("activity_records") {
            Err(StoreError::Storage(DbError::Key { key, .. })) => {
                assert_eq!(key, "activity_records")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
