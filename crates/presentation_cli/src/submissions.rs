//! Operator follow-up on stored submissions

use std::fmt::Write as _;

use application::{StoredSubmission, SubmissionStorePort};
use domain::SubmissionStatus;
use infrastructure::{AsyncDatabase, AsyncDatabaseConfig, DatabaseConfig, SqliteSubmissionStore};

/// Open the configured database and apply pending migrations
pub async fn open_store(
    config: &DatabaseConfig,
) -> anyhow::Result<(AsyncDatabase, SqliteSubmissionStore)> {
    let database = AsyncDatabase::new(&AsyncDatabaseConfig::from(config)).await?;
    database.migrate().await?;
    let store = SqliteSubmissionStore::new(database.pool().clone());
    Ok((database, store))
}

/// Most recent submissions, optionally filtered by status
pub async fn list(
    store: &dyn SubmissionStorePort,
    status: Option<SubmissionStatus>,
    limit: u32,
) -> anyhow::Result<Vec<StoredSubmission>> {
    Ok(store.list_recent(status, limit).await?)
}

/// Update the follow-up status of one row
pub async fn set_status(
    store: &dyn SubmissionStorePort,
    id: i64,
    status: SubmissionStatus,
    notes: Option<String>,
) -> anyhow::Result<()> {
    store.set_status(id, status, notes).await?;
    Ok(())
}

/// Collapse whitespace and cut to `max` characters
fn clip(value: &str, max: usize) -> String {
    let flat = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// One line per submission
pub fn render_table(rows: &[StoredSubmission]) -> String {
    if rows.is_empty() {
        return "No submissions found.".to_string();
    }

    let mut out = format!(
        "{:>5}  {:<16}  {:<9}  {:<20}  {:<28}  {}\n",
        "ID", "RECEIVED", "STATUS", "NAME", "EMAIL", "SUBJECT"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>5}  {:<16}  {:<9}  {:<20}  {:<28}  {}",
            row.id,
            row.created_at.format("%Y-%m-%d %H:%M"),
            row.status,
            clip(&row.name, 20),
            clip(&row.email, 28),
            clip(row.subject.as_deref().unwrap_or("-"), 48),
        );
    }
    out
}
