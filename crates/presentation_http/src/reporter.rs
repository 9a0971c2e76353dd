//! Outcome reporter
//!
//! Maps a [`DeliveryReport`] to what the submitter sees. Accepted
//! submissions always get the same success body; a degraded delivery is
//! logged and only surfaces as `diagnostic` when diagnostics are exposed.

use axum::{Json, http::StatusCode};
use domain::{DeliveryOutcome, DeliveryReport, ValidationError, ValidationReason};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Body of a submission response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    pub request_id: String,
    /// Offending field for rejected input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Machine-readable rejection reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Degraded delivery reason (development only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Message shown for a rejected field
pub fn rejection_message(error: &ValidationError) -> String {
    let field = &error.field;
    match error.reason {
        ValidationReason::Missing => format!("Please fill in the required field: {field}"),
        ValidationReason::InvalidFormat => format!("Please enter a valid {field}"),
        ValidationReason::TooLong => format!("The {field} field is too long"),
        ValidationReason::InvalidType => format!("The {field} field must be text"),
    }
}

/// Status code and body for a processed submission
pub fn respond(
    report: &DeliveryReport,
    expose_diagnostics: bool,
) -> (StatusCode, Json<SubmissionResponse>) {
    let request_id = report.request_id.to_string();

    match &report.outcome {
        DeliveryOutcome::Delivered => (
            StatusCode::OK,
            Json(accepted(report, request_id, None)),
        ),
        DeliveryOutcome::Degraded(reason) => {
            warn!(
                request_id = %report.request_id,
                kind = %report.kind,
                reason = %reason,
                "Submission accepted with degraded delivery"
            );
            let diagnostic = expose_diagnostics.then(|| reason.as_str().to_string());
            (
                StatusCode::OK,
                Json(accepted(report, request_id, diagnostic)),
            )
        },
        DeliveryOutcome::Rejected(error) => (
            StatusCode::BAD_REQUEST,
            Json(SubmissionResponse {
                success: false,
                message: rejection_message(error),
                request_id,
                field: Some(error.field.clone()),
                reason: Some(error.reason.as_str().to_string()),
                diagnostic: None,
            }),
        ),
    }
}

fn accepted(
    report: &DeliveryReport,
    request_id: String,
    diagnostic: Option<String>,
) -> SubmissionResponse {
    SubmissionResponse {
        success: true,
        message: report.kind.success_message().to_string(),
        request_id,
        field: None,
        reason: None,
        diagnostic,
    }
}
