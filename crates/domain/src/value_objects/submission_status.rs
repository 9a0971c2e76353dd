//! Follow-up status of a stored submission

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Operator follow-up state of a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Not yet looked at
    #[default]
    Unread,
    /// Seen by an operator
    Read,
    /// Submitter has been answered
    Replied,
    /// Closed
    Archived,
}

impl SubmissionStatus {
    /// All statuses in lifecycle order
    pub const ALL: [Self; 4] = [Self::Unread, Self::Read, Self::Replied, Self::Archived];

    /// Column value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Replied => "replied",
            Self::Archived => "archived",
        }
    }

    /// Whether the row still needs operator attention
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Unread | Self::Read)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            "replied" => Ok(Self::Replied),
            "archived" => Ok(Self::Archived),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unread() {
        assert_eq!(SubmissionStatus::default(), SubmissionStatus::Unread);
    }

    #[test]
    fn parse_is_case_insensitive() {
        for status in SubmissionStatus::ALL {
            let upper = status.as_str().to_uppercase();
            assert_eq!(upper.parse::<SubmissionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("done".parse::<SubmissionStatus>().is_err());
    }

    #[test]
    fn open_statuses() {
        assert!(SubmissionStatus::Unread.is_open());
        assert!(SubmissionStatus::Read.is_open());
        assert!(!SubmissionStatus::Replied.is_open());
        assert!(!SubmissionStatus::Archived.is_open());
    }
}
