//! Mail configuration: addresses and SMTP transport profiles.

use std::fmt;

use application::services::{DEFAULT_SEND_TIMEOUT_SECS, NotificationSettings};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Connection security for an SMTP transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportSecurity {
    /// Plain connection upgraded with STARTTLS (port 587)
    #[default]
    StartTls,
    /// Implicit TLS (port 465)
    Tls,
    /// No encryption; only for local relays and test servers
    None,
}

impl fmt::Display for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartTls => write!(f, "starttls"),
            Self::Tls => write!(f, "tls"),
            Self::None => write!(f, "none"),
        }
    }
}

/// One SMTP transport profile
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpTransportConfig {
    /// Name used in logs
    #[serde(default = "default_transport_name")]
    pub name: String,

    /// SMTP server host
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// SMTP server port
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Connection security
    #[serde(default)]
    pub security: TransportSecurity,

    /// Login user (empty = no authentication)
    #[serde(default)]
    pub username: String,

    /// Login password or app password (sensitive - uses `SecretString`)
    #[serde(default = "empty_secret", skip_serializing)]
    pub password: SecretString,
}

impl fmt::Debug for SmtpTransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpTransportConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn default_transport_name() -> String {
    "primary".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

impl Default for SmtpTransportConfig {
    fn default() -> Self {
        Self {
            name: default_transport_name(),
            host: default_smtp_host(),
            port: default_smtp_port(),
            security: TransportSecurity::default(),
            username: String::new(),
            password: empty_secret(),
        }
    }
}

impl SmtpTransportConfig {
    /// Whether both username and password are set
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.expose_secret().is_empty()
    }

    /// Whether the password is set
    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }

    /// Get the password as a string reference
    #[must_use]
    pub fn password_str(&self) -> &str {
        self.password.expose_secret()
    }

    /// Whether two profiles reach the same server as the same user
    #[must_use]
    pub fn same_endpoint(&self, other: &Self) -> bool {
        self.host.eq_ignore_ascii_case(&other.host)
            && self.port == other.port
            && self.username == other.username
    }
}

/// Mail section of the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailAppConfig {
    /// Sender address (defaults to the primary transport's username)
    #[serde(default)]
    pub from_address: String,

    /// Sender display name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Mailbox that receives website submissions
    #[serde(default)]
    pub recipient: String,

    /// Additional CC recipients
    #[serde(default)]
    pub cc: Vec<String>,

    /// Operator mailbox for delivery failure alerts
    #[serde(default)]
    pub operator_address: Option<String>,

    /// Timeout for a single send in seconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    /// Transport used first
    #[serde(default)]
    pub primary: SmtpTransportConfig,

    /// Transport used for the single transient-failure retry
    #[serde(default)]
    pub alternate: Option<SmtpTransportConfig>,
}

fn default_from_name() -> String {
    "Website".to_string()
}

const fn default_send_timeout() -> u64 {
    DEFAULT_SEND_TIMEOUT_SECS
}

impl Default for MailAppConfig {
    fn default() -> Self {
        Self {
            from_address: String::new(),
            from_name: default_from_name(),
            recipient: String::new(),
            cc: Vec::new(),
            operator_address: None,
            send_timeout_secs: default_send_timeout(),
            primary: SmtpTransportConfig::default(),
            alternate: None,
        }
    }
}

impl MailAppConfig {
    /// Effective sender address
    #[must_use]
    pub fn sender_address(&self) -> &str {
        if self.from_address.is_empty() {
            &self.primary.username
        } else {
            &self.from_address
        }
    }

    /// Effective recipient (falls back to the sender mailbox)
    #[must_use]
    pub fn recipient_address(&self) -> &str {
        if self.recipient.is_empty() {
            self.sender_address()
        } else {
            &self.recipient
        }
    }

    /// Operator address, ignoring blank values
    #[must_use]
    pub fn operator(&self) -> Option<&str> {
        self.operator_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Addresses for the message composer
    #[must_use]
    pub fn notification_settings(&self) -> NotificationSettings {
        let settings = NotificationSettings::new(self.sender_address(), self.recipient_address())
            .with_from_name(self.from_name.clone())
            .with_cc(self.cc.clone());
        match self.operator() {
            Some(operator) => settings.with_operator(operator),
            None => settings,
        }
    }
}
