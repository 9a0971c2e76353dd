//! Submission store port
//!
//! Durable record of every accepted submission. The write path is a generic
//! `insert(table, fields)`; the read/update path serves operator follow-up.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::SubmissionStatus;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Table that holds website submissions
pub const SUBMISSIONS_TABLE: &str = "contact_messages";

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Table or column name outside `[a-z_]`
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Database unreachable, locked or out of connections
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Statement rejected by the database
    #[error("Query failed: {0}")]
    Query(String),

    /// No row with the given id
    #[error("Record not found: {0}")]
    NotFound(i64),
}

impl StorageError {
    /// Whether a later retry could succeed
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Row id assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row to insert: table name plus ordered column values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRecord {
    /// Target table
    pub table: String,
    /// Column name and value; `None` is stored as NULL
    pub fields: Vec<(String, Option<String>)>,
}

impl StorageRecord {
    /// Start a record for a table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Add a column value
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((column.into(), Some(value.into())));
        self
    }

    /// Add a nullable column value
    #[must_use]
    pub fn with_opt(mut self, column: impl Into<String>, value: Option<&str>) -> Self {
        self.fields.push((column.into(), value.map(str::to_string)));
        self
    }

    /// Value of a column, if set
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }
}

/// A stored submission as read back for follow-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSubmission {
    /// Row id
    pub id: i64,
    /// Request that produced the row
    pub request_id: Option<String>,
    /// Form kind identifier
    pub kind: String,
    /// Submitter name
    pub name: String,
    /// Submitter address
    pub email: String,
    /// Submitter phone
    pub phone: Option<String>,
    /// Subject column
    pub subject: Option<String>,
    /// Message or project details
    pub message: String,
    /// Consultation company
    pub company: Option<String>,
    /// Consultation project type
    pub project_type: Option<String>,
    /// Consultation budget
    pub budget: Option<String>,
    /// Consultation timeline
    pub timeline: Option<String>,
    /// When the row was written
    pub created_at: DateTime<Utc>,
    /// Follow-up status
    pub status: SubmissionStatus,
    /// Operator notes
    pub notes: Option<String>,
}

/// Port for durable submission storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubmissionStorePort: Send + Sync {
    /// Insert a row and return its id
    async fn insert(&self, record: &StorageRecord) -> Result<RecordId, StorageError>;

    /// Most recent submissions first, optionally filtered by status
    async fn list_recent(
        &self,
        status: Option<SubmissionStatus>,
        limit: u32,
    ) -> Result<Vec<StoredSubmission>, StorageError>;

    /// Update follow-up status; notes replace the current notes when given
    async fn set_status(
        &self,
        id: i64,
        status: SubmissionStatus,
        notes: Option<String>,
    ) -> Result<(), StorageError>;

    /// Check if the store is reachable (`SELECT 1`)
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SubmissionStorePort>();
    }

    #[test]
    fn record_builder_keeps_column_order() {
        let record = StorageRecord::new(SUBMISSIONS_TABLE)
            .with("name", "A")
            .with_opt("phone", None)
            .with("email", "a@b.com");
        let columns: Vec<&str> = record.fields.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, vec!["name", "phone", "email"]);
        assert_eq!(record.get("email"), Some("a@b.com"));
        assert_eq!(record.get("phone"), None);
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn transient_classification() {
        assert!(StorageError::Unavailable("busy".to_string()).is_transient());
        assert!(!StorageError::Query("syntax".to_string()).is_transient());
        assert!(!StorageError::NotFound(3).is_transient());
    }

    #[test]
    fn record_id_display() {
        assert_eq!(RecordId(42).to_string(), "42");
    }
}
