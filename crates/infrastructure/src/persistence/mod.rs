//! Persistence module
//!
//! SQLite storage for website submissions.

pub mod async_connection;
pub mod error;
pub mod submission_store;

pub use async_connection::{AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError};
pub use submission_store::SqliteSubmissionStore;
