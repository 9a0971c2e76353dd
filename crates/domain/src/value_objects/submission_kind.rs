//! Submission kind value object
//!
//! The kind is fixed by the route that received the form, never inferred
//! from the payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Which website form produced a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// General contact form
    ContactMessage,
    /// Project consultation request form
    ProjectConsultation,
}

impl SubmissionKind {
    /// Stable identifier, used for the `kind` column and in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ContactMessage => "contact_message",
            Self::ProjectConsultation => "project_consultation",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ContactMessage => "Contact message",
            Self::ProjectConsultation => "Project consultation",
        }
    }

    /// Caller-visible confirmation for an accepted submission
    #[must_use]
    pub const fn success_message(&self) -> &'static str {
        match self {
            Self::ContactMessage => "Message sent successfully!",
            Self::ProjectConsultation => "Project consultation request sent successfully!",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contact_message" | "contact" => Ok(Self::ContactMessage),
            "project_consultation" | "consultation" => Ok(Self::ProjectConsultation),
            other => Err(DomainError::InvalidKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifiers_and_short_names() {
        assert_eq!(
            "contact_message".parse::<SubmissionKind>().unwrap(),
            SubmissionKind::ContactMessage
        );
        assert_eq!(
            "Consultation".parse::<SubmissionKind>().unwrap(),
            SubmissionKind::ProjectConsultation
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "newsletter".parse::<SubmissionKind>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidKind(k) if k == "newsletter"));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(
            SubmissionKind::ProjectConsultation.to_string(),
            "project_consultation"
        );
    }

    #[test]
    fn success_messages_are_kind_specific() {
        assert_eq!(
            SubmissionKind::ContactMessage.success_message(),
            "Message sent successfully!"
        );
        assert_eq!(
            SubmissionKind::ProjectConsultation.success_message(),
            "Project consultation request sent successfully!"
        );
    }
}
