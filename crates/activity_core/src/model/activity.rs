//! Activity registration model.
//!
//! # Responsibility
//! - Define the draft/record payload bound to the registration form.
//! - Parse raw form input into typed fields.
//! - Provide the total category display mapping.
//!
//! # Invariants
//! - `RecordId` is opaque and never reused for another record.
//! - `age` is recomputed whenever `birth_date` changes through
//!   [`ActivityFields::apply_change`].
//! - A rejected field change leaves the fields untouched.

use crate::model::age::age_on;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Date format used by form inputs and persisted records.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Display label for category values outside the known set.
pub const UNKNOWN_CATEGORY_LABEL: &str = "No category";

/// Stable identifier of a stored activity record.
///
/// Remote stores hand out their own document ids; local stores generate
/// UUID v4 strings. Either way the id is independent of list position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of activity being registered.
///
/// Stored data may hold values outside the known set (hand-edited documents,
/// retired options); those are kept verbatim as `Unknown` so the record still
/// loads and renders with [`UNKNOWN_CATEGORY_LABEL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Workshop,
    Meeting,
    Project,
    Other,
    Unknown(String),
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Workshop,
        Category::Meeting,
        Category::Project,
        Category::Other,
    ];

    /// Parses a known value. Legacy form option values (`opcion1`..`opcion4`)
    /// are accepted as aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "workshop" | "opcion1" => Some(Self::Workshop),
            "meeting" | "opcion2" => Some(Self::Meeting),
            "project" | "opcion3" => Some(Self::Project),
            "other" | "opcion4" => Some(Self::Other),
            _ => None,
        }
    }

    /// Reads a persisted value, keeping unrecognized text as `Unknown`.
    pub fn from_stored(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|| Self::Unknown(value.to_string()))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Value written to storage. `Unknown` writes back its raw text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Workshop => "workshop",
            Self::Meeting => "meeting",
            Self::Project => "project",
            Self::Other => "other",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Workshop => "Workshop",
            Self::Meeting => "Meeting",
            Self::Project => "Project",
            Self::Other => "Other",
            Self::Unknown(_) => UNKNOWN_CATEGORY_LABEL,
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    /// Null reads as the default; any string is accepted.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or_else(Self::default, |value| Self::from_stored(&value)))
    }
}

/// Maps any raw category value to its display label.
///
/// Unrecognized values map to [`UNKNOWN_CATEGORY_LABEL`].
pub fn category_label(value: &str) -> &'static str {
    Category::from_stored(value).label()
}

/// Form inputs that can be changed or required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    BirthDate,
    Age,
    Email,
    Phone,
    Address,
    ActivityDate,
    Category,
    Description,
}

impl Field {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "birth_date" => Some(Self::BirthDate),
            "age" => Some(Self::Age),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "address" => Some(Self::Address),
            "activity_date" => Some(Self::ActivityDate),
            "category" => Some(Self::Category),
            "description" => Some(Self::Description),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::BirthDate => "birth_date",
            Self::Age => "age",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::ActivityDate => "activity_date",
            Self::Category => "category",
            Self::Description => "description",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rejected field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    UnknownField(String),
    InvalidDate { field: Field, value: String },
    BirthDateInFuture(NaiveDate),
    InvalidAge(String),
    InvalidCategory(String),
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(name) => write!(f, "unknown form field: `{name}`"),
            Self::InvalidDate { field, value } => {
                write!(f, "invalid date `{value}` for {field}; expected YYYY-MM-DD")
            }
            Self::BirthDateInFuture(date) => write!(f, "date of birth {date} is in the future"),
            Self::InvalidAge(value) => write!(f, "invalid age: `{value}`"),
            Self::InvalidCategory(value) => write!(f, "unknown category: `{value}`"),
        }
    }
}

impl Error for FieldError {}

/// Registration payload shared by the form draft and stored records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityFields {
    /// Full name of the person responsible for the activity.
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Derived from `birth_date`, or entered directly when no birth date is
    /// collected.
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub description: String,
}

impl ActivityFields {
    /// Applies one raw form input to these fields.
    ///
    /// `today` anchors age derivation for `birth_date` changes.
    ///
    /// # Errors
    /// - `UnknownField` when `name` is not a form field.
    /// - `InvalidDate`, `BirthDateInFuture`, `InvalidAge`, `InvalidCategory`
    ///   when `value` cannot be parsed for the field.
    pub fn apply_change(
        &mut self,
        name: &str,
        value: &str,
        today: NaiveDate,
    ) -> Result<(), FieldError> {
        let field =
            Field::from_name(name).ok_or_else(|| FieldError::UnknownField(name.to_string()))?;

        match field {
            Field::Name => self.name = value.to_string(),
            Field::Email => self.email = value.to_string(),
            Field::Phone => self.phone = value.to_string(),
            Field::Address => self.address = value.to_string(),
            Field::Description => self.description = value.to_string(),
            Field::BirthDate => match parse_optional_date(field, value)? {
                Some(birth_date) => {
                    let age =
                        age_on(birth_date, today).ok_or(FieldError::BirthDateInFuture(birth_date))?;
                    self.birth_date = Some(birth_date);
                    self.age = Some(age);
                }
                None => {
                    self.birth_date = None;
                    self.age = None;
                }
            },
            Field::Age => self.age = parse_optional_age(value)?,
            Field::ActivityDate => self.activity_date = parse_optional_date(field, value)?,
            Field::Category => {
                self.category = Category::parse(value)
                    .ok_or_else(|| FieldError::InvalidCategory(value.to_string()))?;
            }
        }

        Ok(())
    }

    /// Returns whether `field` holds no usable value.
    ///
    /// Text is empty when blank after trimming. `category` always has a value.
    pub fn is_empty(&self, field: Field) -> bool {
        match field {
            Field::Name => self.name.trim().is_empty(),
            Field::BirthDate => self.birth_date.is_none(),
            Field::Age => self.age.is_none(),
            Field::Email => self.email.trim().is_empty(),
            Field::Phone => self.phone.trim().is_empty(),
            Field::Address => self.address.trim().is_empty(),
            Field::ActivityDate => self.activity_date.is_none(),
            Field::Category => false,
            Field::Description => self.description.trim().is_empty(),
        }
    }

    /// Returns the subset of `required` that is empty, in input order.
    pub fn missing(&self, required: &[Field]) -> Vec<Field> {
        required
            .iter()
            .copied()
            .filter(|field| self.is_empty(*field))
            .collect()
    }

    /// Case-insensitive name comparison, ignoring surrounding whitespace.
    pub fn same_name_as(&self, other: &ActivityFields) -> bool {
        self.name.trim().to_lowercase() == other.name.trim().to_lowercase()
    }
}

/// Stored activity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: ActivityFields,
}

impl ActivityRecord {
    pub fn new(id: RecordId, fields: ActivityFields) -> Self {
        Self { id, fields }
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn parse_optional_date(field: Field, value: &str) -> Result<Option<NaiveDate>, FieldError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(value)
        .map(Some)
        .ok_or_else(|| FieldError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn parse_optional_age(value: &str) -> Result<Option<i32>, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<i32>() {
        Ok(age) if age >= 0 => Ok(Some(age)),
        _ => Err(FieldError::InvalidAge(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{category_label, parse_optional_age, Category, Field};

    #[test]
    fn category_parse_accepts_legacy_option_values() {
        assert_eq!(Category::parse("opcion2"), Some(Category::Meeting));
        assert_eq!(Category::parse(" PROJECT "), Some(Category::Project));
    }

    #[test]
    fn category_label_falls_back_for_unknown_values() {
        assert_eq!(category_label(""), "No category");
        assert_eq!(category_label("opcion9"), "No category");
    }

    #[test]
    fn stored_categories_accept_aliases_and_keep_unknown_text() {
        let parsed: Vec<Category> =
            serde_json::from_str(r#"["meeting", "opcion3", "party", null]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Category::Meeting,
                Category::Project,
                Category::Unknown("party".to_string()),
                Category::Workshop,
            ]
        );
        assert!(!parsed[2].is_known());
        assert_eq!(
            serde_json::to_string(&parsed[2]).unwrap(),
            r#""party""#
        );
    }

    #[test]
    fn field_names_map_both_ways() {
        for name in [
            "name",
            "birth_date",
            "age",
            "email",
            "phone",
            "address",
            "activity_date",
            "category",
            "description",
        ] {
            let field = Field::from_name(name).expect("known field");
            assert_eq!(field.name(), name);
        }
        assert_eq!(Field::from_name("nombre"), None);
    }

    #[test]
    fn age_input_rejects_negative_and_text() {
        assert_eq!(parse_optional_age(" 42 "), Ok(Some(42)));
        assert_eq!(parse_optional_age(""), Ok(None));
        assert!(parse_optional_age("-1").is_err());
        assert!(parse_optional_age("forty").is_err());
    }
}
