//! Shared error mapping for the sqlx persistence layer

use application::ports::StorageError;

/// SQLite result codes for a busy or locked database
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";

/// Map a sqlx error to a storage port error
pub fn map_sqlx_error(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            StorageError::Unavailable(e.to_string())
        },
        sqlx::Error::Io(io) => StorageError::Unavailable(format!("I/O error: {io}")),
        sqlx::Error::Database(db_err) => {
            let busy = db_err
                .code()
                .is_some_and(|code| code == SQLITE_BUSY || code == SQLITE_LOCKED);
            if busy {
                StorageError::Unavailable(format!("Database busy: {db_err}"))
            } else {
                StorageError::Query(format!("Database error: {db_err}"))
            }
        },
        other => StorageError::Query(format!("Database error: {other}")),
    }
}
