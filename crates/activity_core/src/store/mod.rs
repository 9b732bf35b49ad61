//! Record store contract and persistence strategies.
//!
//! # Responsibility
//! - Define the storage-agnostic CRUD contract the form controller uses.
//! - Provide a local strategy (serialized list under one storage key) and a
//!   remote strategy (hosted document collection).
//!
//! # Invariants
//! - `create` always assigns a fresh `RecordId`.
//! - `update`/`delete` on an unknown id return `StoreError::NotFound` where
//!   the backend can tell.
//! - Read paths reject invalid persisted data instead of masking it.

pub mod local;
pub mod remote;

use crate::db::DbError;
use crate::model::activity::{ActivityFields, ActivityRecord, RecordId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure surfaced by any record store.
#[derive(Debug)]
pub enum StoreError {
    NotFound(RecordId),
    Storage(DbError),
    /// Request never produced an HTTP response (DNS, TLS, connect, decode).
    Transport(String),
    Http { status: u16, body: String },
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Transport(message) => write!(f, "store transport failure: {message}"),
            Self::Http { status, body } => write!(f, "store responded with HTTP {status}: {body}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

/// Storage-agnostic CRUD contract over activity records.
pub trait RecordStore {
    /// Short backend name used in log events.
    fn kind(&self) -> &'static str;
    fn list(&self) -> StoreResult<Vec<ActivityRecord>>;
    fn create(&self, fields: &ActivityFields) -> StoreResult<RecordId>;
    fn update(&self, id: &RecordId, fields: &ActivityFields) -> StoreResult<()>;
    fn delete(&self, id: &RecordId) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn list(&self) -> StoreResult<Vec<ActivityRecord>> {
        (**self).list()
    }

    fn create(&self, fields: &ActivityFields) -> StoreResult<RecordId> {
        (**self).create(fields)
    }

    fn update(&self, id: &RecordId, fields: &ActivityFields) -> StoreResult<()> {
        (**self).update(id, fields)
    }

    fn delete(&self, id: &RecordId) -> StoreResult<()> {
        (**self).delete(id)
    }
}
