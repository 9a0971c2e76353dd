//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: SQLite storage,
//! SMTP transports, configuration loading and telemetry.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;
pub mod validation;

pub use adapters::SmtpMailAdapter;
pub use config::{
    AppConfig, DatabaseConfig, Environment, LogFormat, MailAppConfig, ServerConfig,
    SmtpTransportConfig, TransportSecurity,
};
pub use persistence::{
    AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError, SqliteSubmissionStore,
};
pub use telemetry::{TelemetryConfig, TelemetryError, TelemetryGuard, init_telemetry};
pub use validation::{ConfigValidator, ConfigWarning, WarningSeverity};
