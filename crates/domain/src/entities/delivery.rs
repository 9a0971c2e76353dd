//! Delivery attempts and outcomes
//!
//! Every valid submission ends in exactly one [`DeliveryOutcome`]. The
//! attempt log records what each channel did on the way there.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::value_objects::{RequestId, SubmissionKind};

/// Where a submission is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// Notification email to the site owner
    Email,
    /// Durable database row
    Storage,
}

impl DeliveryChannel {
    /// Channel name used in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Channel accepted the submission; `reference` is the row id or message id
    Success {
        /// Channel-specific reference
        reference: String,
    },
    /// Channel gave up
    Failure {
        /// Internal failure description, never shown to the submitter
        reason: String,
    },
}

impl AttemptOutcome {
    /// Whether the channel succeeded
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One entry in the per-submission attempt log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Channel this attempt belongs to
    pub channel: DeliveryChannel,
    /// When the channel started working on the submission
    pub started_at: DateTime<Utc>,
    /// Final result of the channel
    pub outcome: AttemptOutcome,
    /// Number of sends the channel needed (always 1 for storage)
    pub tries: u8,
}

impl DeliveryAttempt {
    /// Record a successful channel
    pub fn succeeded(
        channel: DeliveryChannel,
        started_at: DateTime<Utc>,
        reference: impl Into<String>,
        tries: u8,
    ) -> Self {
        Self {
            channel,
            started_at,
            outcome: AttemptOutcome::Success {
                reference: reference.into(),
            },
            tries,
        }
    }

    /// Record a failed channel
    pub fn failed(
        channel: DeliveryChannel,
        started_at: DateTime<Utc>,
        reason: impl Into<String>,
        tries: u8,
    ) -> Self {
        Self {
            channel,
            started_at,
            outcome: AttemptOutcome::Failure {
                reason: reason.into(),
            },
            tries,
        }
    }

    /// Whether this attempt succeeded
    pub const fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Which channel(s) failed for a degraded delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// Stored, but no notification went out
    EmailFailed,
    /// Notified, but not stored
    StorageFailed,
    /// Neither channel succeeded
    BothFailed,
}

impl DegradedReason {
    /// Stable wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EmailFailed => "email_failed",
            Self::StorageFailed => "storage_failed",
            Self::BothFailed => "both_failed",
        }
    }
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Both channels succeeded
    Delivered,
    /// At least one channel failed
    Degraded(DegradedReason),
    /// Input was invalid; nothing was delivered
    Rejected(ValidationError),
}

impl DeliveryOutcome {
    /// Combine the two channel results
    pub const fn from_channels(storage_ok: bool, email_ok: bool) -> Self {
        match (storage_ok, email_ok) {
            (true, true) => Self::Delivered,
            (true, false) => Self::Degraded(DegradedReason::EmailFailed),
            (false, true) => Self::Degraded(DegradedReason::StorageFailed),
            (false, false) => Self::Degraded(DegradedReason::BothFailed),
        }
    }

    /// Whether the submitter should be told it went through
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Delivered | Self::Degraded(_))
    }

    /// Short label for logs
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Degraded(reason) => reason.as_str(),
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Everything known about one processed submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Request that carried the submission
    pub request_id: RequestId,
    /// Form kind
    pub kind: SubmissionKind,
    /// Terminal outcome
    pub outcome: DeliveryOutcome,
    /// Append-only attempt log, storage first
    pub attempts: Vec<DeliveryAttempt>,
}

impl DeliveryReport {
    /// Report for input that never reached the channels
    pub const fn rejected(
        request_id: RequestId,
        kind: SubmissionKind,
        error: ValidationError,
    ) -> Self {
        Self {
            request_id,
            kind,
            outcome: DeliveryOutcome::Rejected(error),
            attempts: Vec::new(),
        }
    }

    /// Attempt recorded for a channel, if any
    pub fn attempt(&self, channel: DeliveryChannel) -> Option<&DeliveryAttempt> {
        self.attempts.iter().find(|a| a.channel == channel)
    }
}
