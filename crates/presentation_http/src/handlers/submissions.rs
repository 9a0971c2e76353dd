//! Website form handlers

use axum::{
    Extension, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use domain::{RawSubmission, RequestId, SubmissionKind};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, middleware::FormPayload, reporter, state::AppState};

/// Contact message form
pub async fn submit_contact(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    FormPayload(raw): FormPayload,
) -> Response {
    submit(&state, SubmissionKind::ContactMessage, raw, request_id).await
}

/// Project consultation form
pub async fn submit_consultation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    FormPayload(raw): FormPayload,
) -> Response {
    submit(&state, SubmissionKind::ProjectConsultation, raw, request_id).await
}

async fn submit(
    state: &AppState,
    kind: SubmissionKind,
    raw: RawSubmission,
    request_id: RequestId,
) -> Response {
    match state.submission_service.submit(kind, raw, request_id).await {
        Ok(report) => reporter::respond(&report, state.expose_diagnostics()).into_response(),
        Err(e) => ApiError::from(e).into_response_for(request_id),
    }
}

/// Probe response for `GET /api/contact`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactProbeResponse {
    pub message: String,
    pub timestamp: String,
}

/// Liveness probe for the contact endpoint
pub async fn contact_probe() -> Json<ContactProbeResponse> {
    Json(ContactProbeResponse {
        message: "Contact API endpoint is working!".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
