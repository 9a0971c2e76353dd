//! Submission intake and validation
//!
//! Turns an unstructured form payload into a typed [`Submission`]. Validation
//! is pure: the same input always yields the same result and nothing outside
//! the function is touched.
//!
//! # Examples
//!
//! ```
//! use domain::intake::{RawSubmission, validate};
//! use domain::SubmissionKind;
//!
//! let raw = RawSubmission::new()
//!     .with("name", "A")
//!     .with("email", "a@b.com")
//!     .with("subject", "S")
//!     .with("message", "M");
//! let submission = validate(SubmissionKind::ContactMessage, &raw).unwrap();
//! assert_eq!(submission.subject(), Some("S"));
//!
//! let err = validate(SubmissionKind::ContactMessage, &RawSubmission::new()).unwrap_err();
//! assert_eq!(err.field, "name");
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::entities::{ConsultationDetails, Submission, SubmissionDetails};
use crate::errors::{ValidationError, ValidationReason};
use crate::value_objects::{EmailAddress, SubmissionKind};

/// Maximum length (in characters) of the `name` column
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of the `email` column
pub const MAX_EMAIL_LEN: usize = 100;
/// Maximum length of the `phone` column
pub const MAX_PHONE_LEN: usize = 20;
/// Maximum length of the `subject` column
pub const MAX_SUBJECT_LEN: usize = 200;

/// A single payload value before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Scalar rendered as text
    Text(String),
    /// Array or object where a scalar was expected
    InvalidType,
}

/// Unstructured form payload, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubmission {
    fields: BTreeMap<String, RawValue>,
}

impl RawSubmission {
    /// Empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a text field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields
            .insert(key.into(), RawValue::Text(value.into()));
    }

    /// Build from a decoded JSON body
    ///
    /// Strings are kept as-is, numbers and booleans are rendered to text,
    /// `null` counts as absent and arrays/objects are marked as invalid. A
    /// body that is not a JSON object yields an empty payload.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let fields = object
            .iter()
            .filter_map(|(key, value)| {
                let raw = match value {
                    Value::Null => return None,
                    Value::String(s) => RawValue::Text(s.clone()),
                    Value::Number(n) => RawValue::Text(n.to_string()),
                    Value::Bool(b) => RawValue::Text(b.to_string()),
                    Value::Array(_) | Value::Object(_) => RawValue::InvalidType,
                };
                Some((key.clone(), raw))
            })
            .collect();

        Self { fields }
    }

    /// Build from decoded `application/x-www-form-urlencoded` pairs
    ///
    /// A key sent more than once becomes a list, which is not a valid scalar,
    /// so it is marked as [`RawValue::InvalidType`].
    pub fn from_form_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields = BTreeMap::new();
        for (key, value) in pairs {
            fields
                .entry(key)
                .and_modify(|existing| *existing = RawValue::InvalidType)
                .or_insert(RawValue::Text(value));
        }
        Self { fields }
    }

    /// Look up a field by its payload name or one of its aliases
    pub fn get(&self, keys: &[&str]) -> Option<&RawValue> {
        keys.iter().find_map(|k| self.fields.get(*k))
    }

    /// Number of fields present
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A payload field: the name reported in errors plus accepted aliases
struct Field {
    name: &'static str,
    aliases: &'static [&'static str],
    max_len: Option<usize>,
}

impl Field {
    const fn new(name: &'static str, max_len: Option<usize>) -> Self {
        Self {
            name,
            aliases: &[],
            max_len,
        }
    }

    const fn aliased(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            max_len: None,
        }
    }

    fn lookup<'a>(&self, raw: &'a RawSubmission) -> Option<&'a RawValue> {
        raw.get(&[self.name])
            .or_else(|| raw.get(self.aliases))
    }

    fn error(&self, reason: ValidationReason) -> ValidationError {
        ValidationError::new(self.name, reason)
    }

    fn check_len(&self, value: &str) -> Result<(), ValidationError> {
        match self.max_len {
            Some(max) if value.chars().count() > max => Err(self.error(ValidationReason::TooLong)),
            _ => Ok(()),
        }
    }

    /// Required field: trimmed, non-empty, within the length limit
    fn required(&self, raw: &RawSubmission) -> Result<String, ValidationError> {
        match self.lookup(raw) {
            None => Err(self.error(ValidationReason::Missing)),
            Some(RawValue::InvalidType) => Err(self.error(ValidationReason::InvalidType)),
            Some(RawValue::Text(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(self.error(ValidationReason::Missing));
                }
                self.check_len(trimmed)?;
                Ok(trimmed.to_string())
            },
        }
    }

    /// Optional field: passed through unmodified, blank becomes `None`
    fn optional(&self, raw: &RawSubmission) -> Result<Option<String>, ValidationError> {
        match self.lookup(raw) {
            None => Ok(None),
            Some(RawValue::InvalidType) => Err(self.error(ValidationReason::InvalidType)),
            Some(RawValue::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(RawValue::Text(text)) => {
                self.check_len(text)?;
                Ok(Some(text.clone()))
            },
        }
    }
}

const NAME: Field = Field::new("name", Some(MAX_NAME_LEN));
const EMAIL: Field = Field::new("email", Some(MAX_EMAIL_LEN));
const PHONE: Field = Field::new("phone", Some(MAX_PHONE_LEN));
const SUBJECT: Field = Field::new("subject", Some(MAX_SUBJECT_LEN));
const MESSAGE: Field = Field::new("message", None);
const COMPANY: Field = Field::new("company", None);
const PROJECT_TYPE: Field = Field::aliased("projectType", &["project_type"]);
const PROJECT_DETAILS: Field = Field::aliased("projectDetails", &["project_details"]);
const BUDGET: Field = Field::new("budget", None);
const TIMELINE: Field = Field::new("timeline", None);

/// Validate a raw payload for the given form kind
///
/// Required fields are checked in form order and the first failure is
/// returned: `name`, `email`, then `subject` and `message` for contact
/// messages or `projectDetails` for consultations. Optional fields are
/// checked afterwards.
pub fn validate(kind: SubmissionKind, raw: &RawSubmission) -> Result<Submission, ValidationError> {
    let name = NAME.required(raw)?;
    let email = EMAIL.required(raw)?;
    let email =
        EmailAddress::new(email).map_err(|_| EMAIL.error(ValidationReason::InvalidFormat))?;

    let submission = match kind {
        SubmissionKind::ContactMessage => {
            let subject = SUBJECT.required(raw)?;
            let message = MESSAGE.required(raw)?;
            let phone = PHONE.optional(raw)?;
            Submission::new(
                name,
                email,
                phone,
                SubmissionDetails::ContactMessage { subject, message },
            )
        },
        SubmissionKind::ProjectConsultation => {
            let project_details = PROJECT_DETAILS.required(raw)?;
            let phone = PHONE.optional(raw)?;
            let details = ConsultationDetails {
                company: COMPANY.optional(raw)?,
                project_type: PROJECT_TYPE.optional(raw)?,
                project_details,
                budget: BUDGET.optional(raw)?,
                timeline: TIMELINE.optional(raw)?,
                subject: SUBJECT.optional(raw)?,
            };
            Submission::new(
                name,
                email,
                phone,
                SubmissionDetails::ProjectConsultation(details),
            )
        },
    };

    Ok(submission)
}
