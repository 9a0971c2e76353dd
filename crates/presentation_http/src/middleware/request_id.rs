//! Request ID middleware for HTTP request correlation
//!
//! Reuses a valid UUID from the `X-Request-Id` header or generates a UUIDv7,
//! stores it in the request extensions as a [`RequestId`], opens the
//! request span with it and echoes it on the response.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{body::Body, extract::Request, http::header::HeaderValue, response::Response};
use domain::RequestId;
use tower::{Layer, Service};
use tracing::Instrument;

/// The header name for the request ID
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Layer that adds request ID handling to HTTP services
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service that extracts or generates a request ID for each request
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

/// Request id from the incoming headers, if it is a valid UUID
pub fn incoming_request_id(request: &Request<Body>) -> Option<RequestId> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| RequestId::parse(s.trim()).ok())
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let request_id = incoming_request_id(&request).unwrap_or_default();
        request.extensions_mut().insert(request_id);

        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
        );

        // The clone may not be ready; swap so the polled service handles this call
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let mut response = inner.call(request).await?;

                if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Router, routing::get};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    async fn echo(Extension(id): Extension<RequestId>) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo))
            .layer(RequestIdLayer::new())
    }

    async fn call(header: Option<&str>) -> (String, String) {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (header, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_incoming_id_is_reused() {
        let incoming = Uuid::new_v4().to_string();
        let (header, body) = call(Some(&incoming)).await;
        assert_eq!(header, incoming);
        assert_eq!(body, incoming);
    }

    #[tokio::test]
    async fn invalid_incoming_id_is_replaced() {
        let (header, body) = call(Some("not-a-uuid")).await;
        assert_ne!(header, "not-a-uuid");
        assert_eq!(header, body);
        assert_eq!(Uuid::parse_str(&header).unwrap().get_version_num(), 7);
    }

    #[tokio::test]
    async fn missing_id_is_generated() {
        let (header, body) = call(None).await;
        assert_eq!(header, body);
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[test]
    fn layer_is_zero_sized() {
        assert_eq!(std::mem::size_of_val(&RequestIdLayer::new()), 0);
    }
}
