//! HTTP server configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins (empty = allow any origin)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Graceful shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Log format: "json" for structured JSON logs, "text" for human-readable
    #[serde(default)]
    pub log_format: LogFormat,

    /// Maximum body size for JSON requests in bytes (default: 64KB)
    #[serde(default = "default_max_body_json")]
    pub max_body_size_json_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_shutdown_timeout() -> u64 {
    30
}

const fn default_max_body_json() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            log_format: LogFormat::default(),
            max_body_size_json_bytes: default_max_body_json(),
        }
    }
}

impl ServerConfig {
    /// `host:port` bind address
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
