//! Core logic for activity registrations.
//! The form controller, the record model and every record store live here;
//! front ends only bind inputs and render rows.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod view;

pub use config::{AppConfig, ConfigError, DynRecordStore, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::activity::{
    category_label, ActivityFields, ActivityRecord, Category, Field, FieldError, RecordId,
};
pub use model::age::age_on;
pub use service::form_controller::{
    Clock, FormController, FormError, FormPolicy, StatusKind, StatusMessage, SubmitOutcome,
    SystemClock,
};
pub use store::local::{KeyValueStorage, LocalRecordStore, SqliteKeyValueStorage};
pub use store::remote::firestore::{FirestoreRestClient, FirestoreSettings};
pub use store::remote::{Document, DocumentClient, DocumentFields, RemoteRecordStore};
pub use store::{RecordStore, StoreError, StoreResult};
pub use view::{table_rows, RecordRow, TABLE_HEADERS};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
