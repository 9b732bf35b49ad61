//! SQLite bootstrap for the local key-value storage.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply schema migrations before a connection is handed out.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No storage reads/writes happen before migrations succeed.
//! - Every error names what it was touching: the storage target, the schema
//!   version or the key.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure in the SQLite layer beneath the local record store.
#[derive(Debug)]
pub enum DbError {
    /// Connection to `target` (a file path or `:memory:`) failed or could
    /// not be configured.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// Bringing the schema up to `version` failed; nothing was committed.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The storage was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// Reading or writing one storage key failed.
    Key {
        key: String,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open storage `{target}`: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "storage migration to version {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "storage schema version {found} is newer than supported {supported}"
            ),
            Self::Key { key, source } => write!(f, "storage key `{key}`: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } | Self::Key { source, .. } => {
                Some(source)
            }
            Self::SchemaTooNew { .. } => None,
        }
    }
}
