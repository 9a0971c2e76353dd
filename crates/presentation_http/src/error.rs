//! API error handling
//!
//! Every error body has the form `{success: false, message}`. Internal
//! details are attached only while [`set_expose_internal_errors`] is on,
//! which `main` ties to the development environment.

use std::sync::atomic::{AtomicBool, Ordering};

use application::ApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::RequestId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Global flag to control error detail exposure
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Configure whether internal error details are included in responses
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::SeqCst);
}

/// Whether internal error details are included in responses
pub fn expose_internal_errors() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::SeqCst)
}

/// Generic message for failures the submitter cannot fix
pub const INTERNAL_ERROR_MESSAGE: &str = "Failed to send message, please try again later.";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Request correlation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Internal details (development only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self, request_id: Option<RequestId>) -> ErrorResponse {
        let (message, details) = match self {
            Self::BadRequest(msg) => (msg.clone(), None),
            Self::NotFound => ("Not Found".to_string(), None),
            Self::MethodNotAllowed => ("Method Not Allowed".to_string(), None),
            Self::PayloadTooLarge => ("Request body is too large".to_string(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed with internal error");
                let details = expose_internal_errors().then(|| msg.clone());
                (INTERNAL_ERROR_MESSAGE.to_string(), details)
            },
        };

        ErrorResponse {
            success: false,
            message,
            request_id: request_id.map(|id| id.to_string()),
            details,
        }
    }

    /// Response carrying the request id in the body
    #[must_use]
    pub fn into_response_for(self, request_id: RequestId) -> Response {
        (self.status(), Json(self.body(Some(request_id)))).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body(None))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::TaskAborted(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::BadRequest(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            ApiError::Internal(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn method_not_allowed_body() {
        let response = ApiError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_of(response).await;
        assert!(!body.success);
        assert_eq!(body.message, "Method Not Allowed");
        assert!(body.request_id.is_none());
    }

    #[tokio::test]
    async fn internal_error_detail_follows_flag() {
        // Only this test touches the global flag
        set_expose_internal_errors(false);
        let body = body_of(ApiError::Internal("join error".to_string()).into_response()).await;
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
        assert!(body.details.is_none());

        set_expose_internal_errors(true);
        let body = body_of(ApiError::Internal("join error".to_string()).into_response()).await;
        assert_eq!(body.details.as_deref(), Some("join error"));
        set_expose_internal_errors(false);
    }

    #[tokio::test]
    async fn request_id_is_attached() {
        let id = RequestId::new();
        let body = body_of(ApiError::BadRequest("bad".to_string()).into_response_for(id)).await;
        assert_eq!(body.request_id, Some(id.to_string()));
        assert_eq!(body.message, "bad");
    }

    #[test]
    fn task_abort_maps_to_internal() {
        let err: ApiError = ApplicationError::TaskAborted("panicked".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
