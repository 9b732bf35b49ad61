//! Application configuration and store wiring.
//!
//! # Responsibility
//! - Deserialize store selection and connection settings from JSON.
//! - Build the configured record store as an explicit handle.
//!
//! # Invariants
//! - Connection settings are never compiled in; they arrive through config.
//! - The form policy follows the store kind.

use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::service::form_controller::{FormController, FormPolicy};
use crate::store::local::{LocalRecordStore, SqliteKeyValueStorage, DEFAULT_STORAGE_KEY};
use crate::store::remote::firestore::{
    FirestoreRestClient, FirestoreSettings, DEFAULT_BASE_URL, DEFAULT_DATABASE,
};
use crate::store::remote::{RemoteRecordStore, DEFAULT_COLLECTION};
use crate::store::{RecordStore, StoreError};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Boxed store chosen at runtime.
pub type DynRecordStore = Box<dyn RecordStore>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
    Store(StoreError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
            Self::Store(err) => write!(f, "failed to open store: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for ConfigError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Persistence strategy selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    Local {
        /// SQLite file holding the key-value table.
        db_path: PathBuf,
        #[serde(default = "default_storage_key")]
        storage_key: String,
    },
    Remote {
        project_id: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_collection")]
        collection: String,
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default = "default_database")]
        database: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    /// One of `trace|debug|info|warn|error`; defaults by build mode.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match &self.store {
            StoreConfig::Local { storage_key, .. } if storage_key.trim().is_empty() => Err(
                ConfigError::Invalid("local storage_key cannot be empty".to_string()),
            ),
            StoreConfig::Remote { project_id, .. } if project_id.trim().is_empty() => Err(
                ConfigError::Invalid("remote project_id cannot be empty".to_string()),
            ),
            StoreConfig::Remote { collection, .. } if collection.trim().is_empty() => Err(
                ConfigError::Invalid("remote collection cannot be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Form policy matching the configured store.
    pub fn policy(&self) -> FormPolicy {
        match self.store {
            StoreConfig::Local { .. } => FormPolicy::local(),
            StoreConfig::Remote { .. } => FormPolicy::remote(),
        }
    }

    /// Opens the configured store.
    pub fn open_store(&self) -> Result<DynRecordStore, ConfigError> {
        match &self.store {
            StoreConfig::Local {
                db_path,
                storage_key,
            } => {
                let storage = SqliteKeyValueStorage::open(db_path)?;
                Ok(Box::new(LocalRecordStore::with_key(
                    storage,
                    storage_key.clone(),
                )))
            }
            StoreConfig::Remote {
                project_id,
                api_key,
                collection,
                base_url,
                database,
                timeout_secs,
            } => {
                let settings = FirestoreSettings {
                    base_url: base_url.clone(),
                    project_id: project_id.clone(),
                    database: database.clone(),
                    api_key: api_key.clone(),
                    timeout: Duration::from_secs(*timeout_secs),
                };
                let client = FirestoreRestClient::new(settings)?;
                Ok(Box::new(RemoteRecordStore::with_collection(
                    client,
                    collection.clone(),
                )))
            }
        }
    }

    /// Starts file logging under `log_dir` at the configured level, or the
    /// build-mode default when none is set.
    pub fn init_logging(&self, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
        let level = self.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)
    }

    /// Opens the configured store and wraps it in a form controller.
    pub fn open_controller(&self) -> Result<FormController<DynRecordStore>, ConfigError> {
        Ok(FormController::new(self.open_store()?, self.policy()))
    }
}
