//! SQLite submission store
//!
//! The insert path is generic over table and columns; identifiers are
//! restricted to `[a-z_]` so they can be interpolated into the statement.
//! Values are always bound.

use application::ports::{
    RecordId, SUBMISSIONS_TABLE, StorageError, StorageRecord, StoredSubmission,
    SubmissionStorePort,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::SubmissionStatus;
use sqlx::SqlitePool;
use tracing::{debug, instrument, warn};

use super::error::map_sqlx_error;

/// sqlx-backed implementation of [`SubmissionStorePort`]
#[derive(Debug, Clone)]
pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

impl SqliteSubmissionStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn check_identifier(name: &str) -> Result<(), StorageError> {
        let valid = !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase() || b == b'_');
        if valid {
            Ok(())
        } else {
            Err(StorageError::InvalidIdentifier(name.to_string()))
        }
    }

    fn insert_statement(record: &StorageRecord) -> Result<String, StorageError> {
        Self::check_identifier(&record.table)?;
        if record.fields.is_empty() {
            return Err(StorageError::Query(format!(
                "No columns given for insert into {}",
                record.table
            )));
        }

        let mut columns = Vec::with_capacity(record.fields.len());
        for (column, _) in &record.fields {
            Self::check_identifier(column)?;
            columns.push(column.as_str());
        }
        let placeholders = (1..=columns.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            record.table,
            columns.join(", ")
        ))
    }
}

#[async_trait]
impl SubmissionStorePort for SqliteSubmissionStore {
    #[instrument(skip(self, record), fields(table = %record.table, columns = record.fields.len()))]
    async fn insert(&self, record: &StorageRecord) -> Result<RecordId, StorageError> {
        let statement = Self::insert_statement(record)?;

        let mut query = sqlx::query(&statement);
        for (_, value) in &record.fields {
            query = query.bind(value.as_deref());
        }

        let result = query.execute(&self.pool).await.map_err(map_sqlx_error)?;
        let id = RecordId(result.last_insert_rowid());
        debug!(%id, "Row inserted");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn list_recent(
        &self,
        status: Option<SubmissionStatus>,
        limit: u32,
    ) -> Result<Vec<StoredSubmission>, StorageError> {
        let statement = format!(
            "SELECT id, request_id, kind, name, email, phone, subject, message, company, \
             project_type, budget, timeline, created_at, status, notes \
             FROM {SUBMISSIONS_TABLE} \
             WHERE ($1 IS NULL OR status = $1) \
             ORDER BY id DESC LIMIT $2"
        );

        let rows: Vec<SubmissionRow> = sqlx::query_as(&statement)
            .bind(status.map(|s| s.as_str()))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(SubmissionRow::into_stored).collect()
    }

    #[instrument(skip(self, notes), fields(status = %status))]
    async fn set_status(
        &self,
        id: i64,
        status: SubmissionStatus,
        notes: Option<String>,
    ) -> Result<(), StorageError> {
        let result = match notes {
            Some(notes) => {
                sqlx::query(&format!(
                    "UPDATE {SUBMISSIONS_TABLE} SET status = $1, notes = $2 WHERE id = $3"
                ))
                .bind(status.as_str())
                .bind(notes)
                .bind(id)
                .execute(&self.pool)
                .await
            },
            None => {
                sqlx::query(&format!(
                    "UPDATE {SUBMISSIONS_TABLE} SET status = $1 WHERE id = $2"
                ))
                .bind(status.as_str())
                .bind(id)
                .execute(&self.pool)
                .await
            },
        }
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id));
        }
        debug!("Status updated");
        Ok(())
    }

    async fn is_available(&self) -> bool {
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            },
        }
    }
}

/// Row type for submission queries
#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: i64,
    request_id: Option<String>,
    kind: String,
    name: String,
    email: String,
    phone: Option<String>,
    subject: Option<String>,
    message: String,
    company: Option<String>,
    project_type: Option<String>,
    budget: Option<String>,
    timeline: Option<String>,
    created_at: String,
    status: String,
    notes: Option<String>,
}

impl SubmissionRow {
    fn into_stored(self) -> Result<StoredSubmission, StorageError> {
        let status = self
            .status
            .parse::<SubmissionStatus>()
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(StoredSubmission {
            id: self.id,
            request_id: self.request_id,
            kind: self.kind,
            name: self.name,
            email: self.email,
            phone: self.phone,
            subject: self.subject,
            message: self.message,
            company: self.company,
            project_type: self.project_type,
            budget: self.budget,
            timeline: self.timeline,
            created_at: parse_datetime(&self.created_at)?,
            status,
            notes: self.notes,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query(format!("Invalid datetime {s:?}: {e}")))
}
