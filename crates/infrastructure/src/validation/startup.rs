//! Startup validation for mail, CORS and environment settings

use std::fmt;

use domain::EmailAddress;

use crate::config::{AppConfig, SmtpTransportConfig, TransportSecurity};

/// Environment variable that lets a production start proceed despite critical findings
pub const ALLOW_INSECURE_ENV: &str = "FORMRELAY_ALLOW_INSECURE_CONFIG";

/// Severity level for configuration warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningSeverity {
    /// Informational - no action required
    Info,
    /// Should be addressed, service still works
    Warning,
    /// Submissions will not be delivered as configured
    Critical,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One configuration finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub severity: WarningSeverity,
    /// Stable code, e.g. `CFG001`
    pub code: &'static str,
    pub message: String,
    pub recommendation: String,
}

impl ConfigWarning {
    fn new(
        severity: WarningSeverity,
        code: &'static str,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            recommendation: recommendation.into(),
        }
    }

    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.severity, WarningSeverity::Critical)
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} - {}",
            self.severity, self.code, self.message, self.recommendation
        )
    }
}

/// Validates application configuration before the server starts
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// All findings, critical first
    #[must_use]
    pub fn validate(config: &AppConfig) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let is_production = config.is_production();

        Self::check_credentials(&config.mail.primary, is_production, &mut warnings);
        if let Some(alternate) = &config.mail.alternate {
            Self::check_credentials(alternate, is_production, &mut warnings);
        }
        Self::check_plaintext(config, is_production, &mut warnings);
        Self::check_addresses(config, is_production, &mut warnings);
        Self::check_operator(config, &mut warnings);
        Self::check_alternate(config, &mut warnings);
        Self::check_cors(config, is_production, &mut warnings);

        warnings.sort_by(|a, b| b.severity.cmp(&a.severity));
        warnings
    }

    /// Whether the server should refuse to start
    ///
    /// Only production starts are blocked, and only when `allow_insecure`
    /// (from [`ALLOW_INSECURE_ENV`]) is not set.
    #[must_use]
    pub fn should_block_startup(
        config: &AppConfig,
        warnings: &[ConfigWarning],
        allow_insecure: bool,
    ) -> bool {
        config.is_production() && !allow_insecure && warnings.iter().any(ConfigWarning::is_critical)
    }

    /// Parse the value of [`ALLOW_INSECURE_ENV`]
    #[must_use]
    pub fn allow_insecure_from(value: Option<&str>) -> bool {
        matches!(value.map(str::trim), Some("1" | "true" | "TRUE" | "yes"))
    }

    /// Log all warnings using tracing
    pub fn log_warnings(warnings: &[ConfigWarning]) {
        for warning in warnings {
            match warning.severity {
                WarningSeverity::Critical => {
                    tracing::error!(
                        code = warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Configuration issue"
                    );
                },
                WarningSeverity::Warning => {
                    tracing::warn!(
                        code = warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Configuration warning"
                    );
                },
                WarningSeverity::Info => {
                    tracing::info!(
                        code = warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Configuration notice"
                    );
                },
            }
        }
    }

    const fn escalate(is_production: bool, otherwise: WarningSeverity) -> WarningSeverity {
        if is_production {
            WarningSeverity::Critical
        } else {
            otherwise
        }
    }

    fn check_credentials(
        transport: &SmtpTransportConfig,
        is_production: bool,
        warnings: &mut Vec<ConfigWarning>,
    ) {
        let has_user = !transport.username.is_empty();
        let has_password = transport.has_password();

        if has_user != has_password {
            warnings.push(ConfigWarning::new(
                WarningSeverity::Warning,
                "CFG001",
                format!(
                    "Transport '{}' has a username or a password but not both; \
                     it will connect without authentication",
                    transport.name
                ),
                "Set both mail.<transport>.username and password, \
                 or EMAIL_USER and EMAIL_APP_PASSWORD",
            ));
        } else if !has_user && transport.security != TransportSecurity::None {
            warnings.push(ConfigWarning::new(
                Self::escalate(is_production, WarningSeverity::Warning),
                "CFG001",
                format!(
                    "Transport '{}' has no SMTP credentials for {}",
                    transport.name, transport.host
                ),
                "Set EMAIL_USER and EMAIL_APP_PASSWORD or the transport's username and password",
            ));
        }
    }

    fn check_plaintext(config: &AppConfig, is_production: bool, warnings: &mut Vec<ConfigWarning>) {
        let transports =
            std::iter::once(&config.mail.primary).chain(config.mail.alternate.as_ref());
        for transport in transports {
            if transport.security == TransportSecurity::None {
                warnings.push(ConfigWarning::new(
                    Self::escalate(is_production, WarningSeverity::Info),
                    "CFG002",
                    format!(
                        "Transport '{}' sends mail without encryption",
                        transport.name
                    ),
                    "Use security = \"starttls\" or \"tls\" outside local test relays",
                ));
            }
        }
    }

    fn check_addresses(config: &AppConfig, is_production: bool, warnings: &mut Vec<ConfigWarning>) {
        let mail = &config.mail;
        if mail.sender_address().is_empty() {
            warnings.push(ConfigWarning::new(
                Self::escalate(is_production, WarningSeverity::Warning),
                "CFG003",
                "No sender or recipient address is configured",
                "Set mail.from_address and mail.recipient, or EMAIL_USER",
            ));
            return;
        }

        let mut addresses = vec![
            ("mail.from_address", mail.sender_address()),
            ("mail.recipient", mail.recipient_address()),
        ];
        addresses.extend(mail.cc.iter().map(|cc| ("mail.cc", cc.as_str())));
        if let Some(operator) = mail.operator() {
            addresses.push(("mail.operator_address", operator));
        }

        for (key, address) in addresses {
            if EmailAddress::new(address).is_err() {
                warnings.push(ConfigWarning::new(
                    Self::escalate(is_production, WarningSeverity::Warning),
                    "CFG004",
                    format!("{key} is not a valid address: {address}"),
                    format!("Fix {key}"),
                ));
            }
        }
    }

    fn check_operator(config: &AppConfig, warnings: &mut Vec<ConfigWarning>) {
        if config.mail.operator().is_none() {
            warnings.push(ConfigWarning::new(
                WarningSeverity::Info,
                "CFG005",
                "No operator address; notification failures are only logged",
                "Set mail.operator_address to receive delivery failure alerts",
            ));
        }
    }

    fn check_alternate(config: &AppConfig, warnings: &mut Vec<ConfigWarning>) {
        if let Some(alternate) = &config.mail.alternate {
            if alternate.same_endpoint(&config.mail.primary) {
                warnings.push(ConfigWarning::new(
                    WarningSeverity::Warning,
                    "CFG006",
                    "Alternate transport points at the same server and account as the primary",
                    "Configure a different provider or account for mail.alternate",
                ));
            }
        }
    }

    fn check_cors(config: &AppConfig, is_production: bool, warnings: &mut Vec<ConfigWarning>) {
        if config.server.allowed_origins.is_empty()
            || config.server.allowed_origins.iter().any(|o| o == "*")
        {
            let severity = if is_production {
                WarningSeverity::Warning
            } else {
                WarningSeverity::Info
            };
            warnings.push(ConfigWarning::new(
                severity,
                "CFG007",
                "CORS allows requests from any origin",
                "List the website's origins in server.allowed_origins",
            ));
        }
    }
}
