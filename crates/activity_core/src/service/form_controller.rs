//! Registration form controller.
//!
//! # Responsibility
//! - Own the draft record, edit-mode state and the transient status message.
//! - Validate submissions against a [`FormPolicy`] before touching storage.
//! - Delegate persistence to one [`RecordStore`] and mirror its list.
//!
//! # Invariants
//! - A rejected submission never reaches the store.
//! - The draft resets and edit mode clears only after a successful write.
//! - Success messages expire [`STATUS_CLEAR_DELAY_SECS`] seconds after they
//!   are set; a newer message simply replaces an older one.
//! - Store failures are logged and returned; they never leave the controller
//!   in a half-updated state.

use crate::model::activity::{ActivityFields, ActivityRecord, Field, FieldError, RecordId};
use crate::store::{RecordStore, StoreError};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Seconds a success message stays visible.
pub const STATUS_CLEAR_DELAY_SECS: i64 = 3;

pub const MSG_REQUIRED_FIELDS: &str = "All required fields must be filled in.";
pub const MSG_DUPLICATE_NAME: &str = "A record with this name already exists.";
pub const MSG_CREATED: &str = "Record created successfully.";
pub const MSG_UPDATED: &str = "Record updated successfully.";
pub const MSG_DELETED: &str = "Record deleted successfully.";

/// Time source for age derivation and message expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for age derivation.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock; `today` follows the local calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Which fields a submission requires and whether names must be unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPolicy {
    pub required: Vec<Field>,
    /// Reject names that match another record case-insensitively.
    pub unique_names: bool,
}

impl FormPolicy {
    /// Full contact form used with the hosted collection.
    pub fn remote() -> Self {
        Self {
            required: vec![
                Field::Name,
                Field::BirthDate,
                Field::Email,
                Field::Phone,
                Field::Address,
                Field::ActivityDate,
                Field::Description,
            ],
            unique_names: false,
        }
    }

    /// Compact form used with local storage.
    pub fn local() -> Self {
        Self {
            required: vec![Field::Name, Field::ActivityDate, Field::Description],
            unique_names: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Warning,
}

/// User-visible feedback line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    /// `None` keeps the message until the next one replaces it.
    pub expires_at: Option<DateTime<Utc>>,
}

impl StatusMessage {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Successful submission result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(RecordId),
    Updated(RecordId),
}

/// Rejected or failed submission.
#[derive(Debug)]
pub enum FormError {
    /// Required fields are empty; listed in policy order.
    Validation { missing: Vec<Field> },
    /// Another record already uses this name.
    Duplicate { name: String },
    Store(StoreError),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { missing } => {
                let names: Vec<&str> = missing.iter().map(|field| field.name()).collect();
                write!(f, "required fields are empty: {}", names.join(", "))
            }
            Self::Duplicate { name } => write!(f, "a record named `{name}` already exists"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for FormError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Form controller parameterized by its record store.
pub struct FormController<S: RecordStore> {
    store: S,
    policy: FormPolicy,
    clock: Arc<dyn Clock>,
    draft: ActivityFields,
    editing: Option<RecordId>,
    status: Option<StatusMessage>,
    records: Vec<ActivityRecord>,
}

impl<S: RecordStore> FormController<S> {
    /// Creates a controller on the wall clock and loads the current list.
    pub fn new(store: S, policy: FormPolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, policy: FormPolicy, clock: Arc<dyn Clock>) -> Self {
        let mut controller = Self {
            store,
            policy,
            clock,
            draft: ActivityFields::default(),
            editing: None,
            status: None,
            records: Vec::new(),
        };
        controller.refresh();
        controller
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &FormPolicy {
        &self.policy
    }

    pub fn draft(&self) -> &ActivityFields {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_id(&self) -> Option<&RecordId> {
        self.editing.as_ref()
    }

    /// Records as of the last successful refresh.
    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    /// Current status message, or `None` once it has expired.
    pub fn status(&self) -> Option<&StatusMessage> {
        let now = self.clock.now();
        self.status
            .as_ref()
            .filter(|message| message.is_visible_at(now))
    }

    /// Reloads the record list from the store.
    ///
    /// On failure the previous list is kept and `false` is returned.
    pub fn refresh(&mut self) -> bool {
        match self.store.list() {
            Ok(records) => {
                self.records = records;
                true
            }
            Err(err) => {
                error!(
                    "event=records_refresh module=service status=error store={} error={}",
                    self.store.kind(),
                    err
                );
                false
            }
        }
    }

    /// Applies one raw input to the draft.
    ///
    /// Changing `birth_date` also recomputes `age`.
    pub fn change_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let today = self.clock.today();
        self.draft.apply_change(name, value, today)
    }

    /// Validates the draft and creates or updates a record.
    ///
    /// # Errors
    /// - `Validation` when required fields are empty.
    /// - `Duplicate` when the policy demands unique names and another record
    ///   shares the draft's name.
    /// - `Store` when the store rejects the write; the draft is kept.
    pub fn submit(&mut self) -> Result<SubmitOutcome, FormError> {
        let missing = self.draft.missing(&self.policy.required);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|field| field.name()).collect();
            warn!(
                "event=form_submit module=service status=rejected reason=validation missing={}",
                names.join(",")
            );
            self.set_warning(MSG_REQUIRED_FIELDS);
            return Err(FormError::Validation { missing });
        }

        if self.policy.unique_names {
            match self.has_duplicate_name() {
                Ok(false) => {}
                Ok(true) => {
                    warn!("event=form_submit module=service status=rejected reason=duplicate");
                    self.set_warning(MSG_DUPLICATE_NAME);
                    return Err(FormError::Duplicate {
                        name: self.draft.name.clone(),
                    });
                }
                Err(err) => return Err(self.store_failure("form_submit", err)),
            }
        }

        let outcome = match self.editing.clone() {
            Some(id) => self
                .store
                .update(&id, &self.draft)
                .map(|()| SubmitOutcome::Updated(id)),
            None => self.store.create(&self.draft).map(SubmitOutcome::Created),
        };
        let outcome = outcome.map_err(|err| self.store_failure("form_submit", err))?;

        let (mode, id, text) = match &outcome {
            SubmitOutcome::Created(id) => ("create", id, MSG_CREATED),
            SubmitOutcome::Updated(id) => ("update", id, MSG_UPDATED),
        };
        info!(
            "event=form_submit module=service status=ok mode={} store={} record_id={}",
            mode,
            self.store.kind(),
            id
        );

        self.reset_draft();
        self.set_success(text);
        self.refresh();
        Ok(outcome)
    }

    /// Loads `record` into the draft and enters edit mode for its id.
    pub fn begin_edit(&mut self, record: &ActivityRecord) {
        self.draft = record.fields.clone();
        self.editing = Some(record.id.clone());
    }

    /// Leaves edit mode and discards the draft.
    pub fn cancel_edit(&mut self) {
        self.reset_draft();
    }

    /// Deletes one record.
    ///
    /// Deleting the record under edit also leaves edit mode and resets the
    /// draft.
    pub fn delete(&mut self, id: &RecordId) -> Result<(), FormError> {
        self.store
            .delete(id)
            .map_err(|err| self.store_failure("record_delete", err))?;

        info!(
            "event=record_delete module=service status=ok store={} record_id={}",
            self.store.kind(),
            id
        );
        if self.editing.as_ref() == Some(id) {
            self.reset_draft();
        }
        self.set_success(MSG_DELETED);
        self.refresh();
        Ok(())
    }

    fn has_duplicate_name(&self) -> Result<bool, StoreError> {
        let records = self.store.list()?;
        Ok(records.iter().any(|record| {
            Some(&record.id) != self.editing.as_ref() && record.fields.same_name_as(&self.draft)
        }))
    }

    fn reset_draft(&mut self) {
        self.draft = ActivityFields::default();
        self.editing = None;
    }

    fn set_warning(&mut self, text: &str) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Warning,
            text: text.to_string(),
            expires_at: None,
        });
    }

    fn set_success(&mut self, text: &str) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Success,
            text: text.to_string(),
            expires_at: Some(self.clock.now() + Duration::seconds(STATUS_CLEAR_DELAY_SECS)),
        });
    }

    fn store_failure(&mut self, event: &str, err: StoreError) -> FormError {
        error!(
            "event={} module=service status=error store={} error={}",
            event,
            self.store.kind(),
            err
        );
        self.status = None;
        FormError::Store(err)
    }
}
