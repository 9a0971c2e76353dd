//! Form payload extraction
//!
//! Provides a `FormPayload` extractor that parses the request body into a
//! [`RawSubmission`]. URL-encoded form posts are decoded as form pairs and
//! everything else as JSON. Field validation happens later in the domain
//! validator; this layer only rejects bodies that cannot be decoded at all.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use domain::{RawSubmission, RequestId};
use thiserror::Error;

use crate::error::ApiError;

/// Body rejection
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid JSON body: {0}")]
    Malformed(String),
    #[error("Invalid form body: {0}")]
    MalformedForm(String),
    #[error("Request body is too large")]
    TooLarge,
    #[error("Failed to read request body: {0}")]
    Unreadable(String),
}

/// Rejection carrying the request id so the error body can echo it
#[derive(Debug)]
pub struct PayloadRejection {
    error: PayloadError,
    request_id: Option<RequestId>,
}

impl PayloadRejection {
    /// Underlying error
    pub const fn error(&self) -> &PayloadError {
        &self.error
    }
}

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        let api_error = match self.error {
            PayloadError::TooLarge => ApiError::PayloadTooLarge,
            other => ApiError::BadRequest(other.to_string()),
        };
        match self.request_id {
            Some(id) => api_error.into_response_for(id),
            None => api_error.into_response(),
        }
    }
}

/// A JSON or URL-encoded request body as an unstructured submission
///
/// JSON is the default: a missing or unknown `Content-Type` is still parsed
/// as JSON, since plain HTML form scripts do not always set it.
#[derive(Debug, Clone, Default)]
pub struct FormPayload(pub RawSubmission);

impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = PayloadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req.extensions().get::<RequestId>().copied();
        let url_encoded = is_url_encoded(&req);
        let reject = |error| PayloadRejection { error, request_id };

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                reject(PayloadError::TooLarge)
            } else {
                reject(PayloadError::Unreadable(e.body_text()))
            }
        })?;

        if url_encoded {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| reject(PayloadError::MalformedForm(e.to_string())))?;
            return Ok(Self(RawSubmission::from_form_pairs(pairs)));
        }

        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| reject(PayloadError::Malformed(e.to_string())))?;

        Ok(Self(RawSubmission::from_json(&value)))
    }
}

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

fn is_url_encoded(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}
