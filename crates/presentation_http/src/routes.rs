//! Route definitions

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use infrastructure::ServerConfig;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::warn;

use crate::{
    error::ApiError,
    handlers,
    middleware::RequestIdLayer,
    state::AppState,
};

/// Create the main router with all routes
///
/// Includes request id handling and the body size limit. CORS and access
/// logging are added by the server binary.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_size_json_bytes;

    Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/api/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Form endpoints
        .route(
            "/api/contact",
            get(handlers::submissions::contact_probe).post(handlers::submissions::submit_contact),
        )
        .route(
            "/api/contact/send-message",
            post(handlers::submissions::submit_contact),
        )
        .route(
            "/api/project-consultation",
            post(handlers::submissions::submit_consultation),
        )
        // Development diagnostics
        .route("/api/debug", get(handlers::debug::debug_info))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(RequestIdLayer::new())
        // Attach state
        .with_state(state)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// CORS policy from the server configuration
///
/// An empty origin list or `*` allows any origin.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")]);

    if config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
