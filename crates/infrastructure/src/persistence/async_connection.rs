//! SQLite connection pool using sqlx
//!
//! Migrations are embedded from the workspace `migrations/` directory.

use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;

/// Error type for pool setup and migrations
#[derive(Debug, thiserror::Error)]
pub enum AsyncDatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Pool settings
#[derive(Debug, Clone)]
pub struct AsyncDatabaseConfig {
    /// Database URL (e.g., "sqlite:formrelay.db" or "sqlite::memory:")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enable WAL journaling (ignored for in-memory databases)
    pub wal_mode: bool,
    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,
}

impl Default for AsyncDatabaseConfig {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

impl From<&DatabaseConfig> for AsyncDatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        if config.is_in_memory() {
            return Self::in_memory();
        }
        Self {
            url: config.url(),
            max_connections: config.max_connections.max(1),
            wal_mode: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl AsyncDatabaseConfig {
    /// In-memory database for tests
    ///
    /// Each connection of an in-memory pool would see its own database,
    /// so the pool holds exactly one.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            wal_mode: false,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// File-based database at `path`
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            url: format!("sqlite:{}", path.as_ref().display()),
            max_connections: 5,
            wal_mode: true,
            busy_timeout: Duration::from_secs(5),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

/// Shared SQLite pool
#[derive(Debug, Clone)]
pub struct AsyncDatabase {
    pool: SqlitePool,
}

impl AsyncDatabase {
    /// Open the pool, creating the database file if needed
    #[instrument(skip_all, fields(url = %config.url))]
    pub async fn new(config: &AsyncDatabaseConfig) -> Result<Self, AsyncDatabaseError> {
        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout);

        if config.wal_mode && !config.is_in_memory() {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
            debug!("WAL mode enabled");
        }

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            // Dropping the last connection discards the database
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        Ok(Self { pool })
    }

    /// In-memory database for tests
    pub async fn in_memory() -> Result<Self, AsyncDatabaseError> {
        Self::new(&AsyncDatabaseConfig::in_memory()).await
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply pending migrations
    ///
    /// Returns the number of migrations that were applied by this call.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<usize, AsyncDatabaseError> {
        let migrator = sqlx::migrate!("../../migrations");

        let before = self.applied_migrations().await;
        migrator.run(&self.pool).await?;
        let after = self.applied_migrations().await;

        let applied = after.saturating_sub(before);
        info!(applied, total = after, "Database migrations completed");
        Ok(applied)
    }

    async fn applied_migrations(&self) -> usize {
        // The tracking table does not exist before the first run
        let count: Result<i64, _> =
            sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await;
        count.map_or(0, |c| usize::try_from(c).unwrap_or(0))
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }
}
