//! Domain-level errors

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a submitted field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    /// Required field absent or blank
    Missing,
    /// Value does not have the expected shape (e.g. an email address)
    InvalidFormat,
    /// Value exceeds the column width it is stored in
    TooLong,
    /// Value was a JSON array or object instead of a scalar
    InvalidType,
}

impl ValidationReason {
    /// Stable wire name of the reason
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::InvalidFormat => "invalid_format",
            Self::TooLong => "too_long",
            Self::InvalidType => "invalid_type",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client-caused rejection naming the offending field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Field name as it appears in the request payload
    pub field: String,
    /// Why the field was rejected
    pub reason: ValidationReason,
}

impl ValidationError {
    /// Create a validation error for a field
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    /// Shorthand for a missing required field
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, ValidationReason::Missing)
    }
}

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Invalid email address format
    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),

    /// Submission failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown follow-up status
    #[error("Invalid submission status: {0}")]
    InvalidStatus(String),

    /// Unknown submission kind
    #[error("Invalid submission kind: {0}")]
    InvalidKind(String),
}
