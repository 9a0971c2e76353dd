//! Development diagnostics
//!
//! Reports which mail settings are present, never their values. Answers 404
//! in production.

use axum::{Json, extract::State, http::Method};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};

/// Presence of mail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettingsPresence {
    pub sender_configured: bool,
    pub recipient_configured: bool,
    pub username_set: bool,
    pub password_set: bool,
    pub alternate_configured: bool,
    pub operator_configured: bool,
    pub transport_security: String,
}

/// Debug endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugResponse {
    pub message: String,
    pub timestamp: String,
    pub method: String,
    pub environment: String,
    pub version: String,
    pub mail: MailSettingsPresence,
}

/// `GET /api/debug`
pub async fn debug_info(
    State(state): State<AppState>,
    method: Method,
) -> Result<Json<DebugResponse>, ApiError> {
    let config = &state.config;
    if config.is_production() {
        return Err(ApiError::NotFound);
    }

    let mail = &config.mail;
    Ok(Json(DebugResponse {
        message: "Debug endpoint".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        method: method.to_string(),
        environment: config.environment.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mail: MailSettingsPresence {
            sender_configured: !mail.sender_address().is_empty(),
            recipient_configured: !mail.recipient.is_empty(),
            username_set: !mail.primary.username.is_empty(),
            password_set: mail.primary.has_password(),
            alternate_configured: mail.alternate.is_some(),
            operator_configured: mail.operator().is_some(),
            transport_security: mail.primary.security.to_string(),
        },
    }))
}
