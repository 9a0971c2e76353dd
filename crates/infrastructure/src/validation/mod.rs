//! Configuration validation module
//!
//! Startup checks that turn risky or incomplete configuration into logged
//! warnings. Critical findings block a production start.

pub mod startup;

pub use startup::{ALLOW_INSECURE_ENV, ConfigValidator, ConfigWarning, WarningSeverity};
