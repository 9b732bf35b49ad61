//! Domain model for activity registrations.
//!
//! # Responsibility
//! - Define the record shape shared by the form controller and every store.
//! - Keep field parsing and age derivation next to the data they produce.
//!
//! # Invariants
//! - Every stored record is identified by a `RecordId` that does not depend
//!   on its position in any list.
//! - Form input only accepts the four known categories; stored values outside
//!   that set load as `Category::Unknown` and render with the fallback label.

pub mod activity;
pub mod age;
