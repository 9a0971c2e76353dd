//! Application configuration
//!
//! Layered: built-in defaults, then an optional `config.toml` (or the file
//! named by `FORMRELAY_CONFIG`), then `FORMRELAY_*` environment variables
//! with `__` as the nesting separator (`FORMRELAY_MAIL__RECIPIENT`).
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `database`: SQLite database settings
//! - `mail`: addresses and SMTP transport profiles

mod database;
mod mail;
mod server;

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use database::DatabaseConfig;
pub use mail::{MailAppConfig, SmtpTransportConfig, TransportSecurity};
pub use server::{LogFormat, ServerConfig};

use crate::telemetry::TelemetryConfig;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "FORMRELAY";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "FORMRELAY_CONFIG";

/// Legacy deployment variable holding the SMTP login
pub const LEGACY_EMAIL_USER: &str = "EMAIL_USER";

/// Legacy deployment variables holding the SMTP password, in lookup order
pub const LEGACY_EMAIL_PASSWORDS: [&str; 2] = ["EMAIL_APP_PASSWORD", "EMAIL_PASSWORD"];

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Application environment (development or production)
///
/// Controls diagnostic exposure and validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment - diagnostics exposed, relaxed warnings
    #[default]
    Development,
    /// Production environment - strict validation, no diagnostics
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development or production)
    #[serde(default)]
    pub environment: Environment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Mail addresses and transports
    #[serde(default)]
    pub mail: MailAppConfig,

    /// Logging and OpenTelemetry export
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from the environment and an optional file
    ///
    /// The file is `config.toml` in the working directory unless
    /// `FORMRELAY_CONFIG` names another one. Legacy `EMAIL_USER` /
    /// `EMAIL_APP_PASSWORD` variables fill empty primary credentials.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        let mut config = Self::load_from(path.as_deref())?;
        config.apply_env_credentials(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file (required if given)
    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let builder = config::Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Load from file if exists
            .add_source(file)
            // Override with environment variables (e.g., FORMRELAY_SERVER__PORT)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("mail.cc")
                    .with_list_parse_key("server.allowed_origins"),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Fill empty primary transport credentials from the legacy variables
    ///
    /// Values already present in the file or `FORMRELAY_*` variables are
    /// never overridden. Returns the names of the variables that were used.
    pub fn apply_env_credentials<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut applied = Vec::new();
        let primary = &mut self.mail.primary;

        if primary.username.is_empty() {
            if let Some(user) = non_empty(LEGACY_EMAIL_USER) {
                primary.username = user;
                applied.push(LEGACY_EMAIL_USER);
            }
        }

        if !primary.has_password() {
            if let Some((key, password)) = LEGACY_EMAIL_PASSWORDS
                .iter()
                .find_map(|key| non_empty(key).map(|v| (*key, v)))
            {
                primary.password = SecretString::from(password);
                applied.push(key);
            }
        }

        for key in &applied {
            debug!(variable = key, "Loaded primary mail credential from legacy variable");
        }
        applied
    }

    /// Whether the service runs in production
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Redacted view of the configuration for operators
    ///
    /// Secrets are never serialized; this only reports whether they are set.
    #[must_use]
    pub fn redacted_summary(&self) -> serde_json::Value {
        let transport = |t: &SmtpTransportConfig| {
            serde_json::json!({
                "name": t.name,
                "host": t.host,
                "port": t.port,
                "security": t.security.to_string(),
                "username": t.username,
                "password_set": t.has_password(),
            })
        };

        serde_json::json!({
            "environment": self.environment.to_string(),
            "server": {
                "bind": self.server.bind_address(),
                "allowed_origins": self.server.allowed_origins,
                "log_format": self.server.log_format.to_string(),
            },
            "database": {
                "path": self.database.path,
                "run_migrations": self.database.run_migrations,
            },
            "mail": {
                "from": self.mail.sender_address(),
                "recipient": self.mail.recipient_address(),
                "cc": self.mail.cc,
                "operator_address": self.mail.operator(),
                "send_timeout_secs": self.mail.send_timeout_secs,
                "primary": transport(&self.mail.primary),
                "alternate": self.mail.alternate.as_ref().map(transport),
            },
            "telemetry": {
                "enabled": self.telemetry.enabled,
                "endpoint": self.telemetry.endpoint,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_parses_short_names() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Development".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn environment_defaults_to_development() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.is_production());
    }

    #[test]
    fn legacy_variables_fill_empty_credentials() {
        let mut config = AppConfig::default();
        let applied = config.apply_env_credentials(lookup(&[
            ("EMAIL_USER", "site@gmail.com"),
            ("EMAIL_APP_PASSWORD", "abcd efgh"),
            ("EMAIL_PASSWORD", "ignored"),
        ]));

        assert_eq!(applied, vec!["EMAIL_USER", "EMAIL_APP_PASSWORD"]);
        assert_eq!(config.mail.primary.username, "site@gmail.com");
        assert_eq!(config.mail.primary.password_str(), "abcd efgh");
    }

    #[test]
    fn plain_password_variable_is_fallback() {
        let mut config = AppConfig::default();
        config.apply_env_credentials(lookup(&[("EMAIL_PASSWORD", "secret")]));
        assert_eq!(config.mail.primary.password_str(), "secret");
    }

    #[test]
    fn configured_credentials_are_not_overridden() {
        let mut config = AppConfig::default();
        config.mail.primary.username = "configured@example.com".to_string();
        config.mail.primary.password = SecretString::from("configured".to_string());

        let applied = config.apply_env_credentials(lookup(&[
            ("EMAIL_USER", "legacy@example.com"),
            ("EMAIL_PASSWORD", "legacy"),
        ]));

        assert!(applied.is_empty());
        assert_eq!(config.mail.primary.username, "configured@example.com");
        assert_eq!(config.mail.primary.password_str(), "configured");
    }

    #[test]
    fn blank_legacy_values_are_ignored() {
        let mut config = AppConfig::default();
        let applied = config.apply_env_credentials(lookup(&[("EMAIL_USER", "  ")]));
        assert!(applied.is_empty());
        assert!(config.mail.primary.username.is_empty());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formrelay.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
environment = "production"

[server]
port = 8080
allowed_origins = ["https://example.com"]

[mail]
recipient = "owner@example.com"
operator_address = "ops@example.com"
send_timeout_secs = 5

[mail.primary]
host = "smtp.example.com"
port = 465
security = "tls"
username = "site@example.com"
password = "from-file"

[mail.alternate]
name = "backup"
host = "smtp.backup.example.com"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str()).unwrap();

        assert!(config.is_production());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.allowed_origins, vec!["https://example.com"]);
        assert_eq!(config.mail.recipient, "owner@example.com");
        assert_eq!(config.mail.send_timeout_secs, 5);
        assert_eq!(config.mail.primary.security, TransportSecurity::Tls);
        assert_eq!(config.mail.primary.password_str(), "from-file");
        let alternate = config.mail.alternate.unwrap();
        assert_eq!(alternate.name, "backup");
        assert_eq!(alternate.port, 587);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(AppConfig::load_from(Some("/nonexistent/formrelay.toml")).is_err());
    }

    #[test]
    fn redacted_summary_hides_password() {
        let mut config = AppConfig::default();
        config.mail.primary.username = "site@example.com".to_string();
        config.mail.primary.password = SecretString::from("hunter2".to_string());

        let summary = config.redacted_summary();
        let text = summary.to_string();

        assert!(!text.contains("hunter2"));
        assert_eq!(summary["mail"]["primary"]["password_set"], true);
        assert_eq!(summary["mail"]["from"], "site@example.com");
        assert!(summary["mail"]["alternate"].is_null());
    }
}
