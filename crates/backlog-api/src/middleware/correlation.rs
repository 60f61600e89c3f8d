//! Correlation of problem responses with request spans
//!
//! Every error response leaving the service must be a problem document. Responses that
//! were produced below the handlers (router fallbacks, method mismatch, body limit,
//! timeout) carry no [`CorrelationId`] and are re-rendered here as protocol problems.

use std::any::Any;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Span;

use crate::error::{HttpAppError, ProtocolError};
use crate::problem::CorrelationId;

/// Span for one HTTP request; `correlation_id` is filled in when a problem is returned.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        correlation_id = tracing::field::Empty,
    )
}

pub async fn correlation_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let status = response.status();

    let is_error = status.is_client_error() || status.is_server_error();
    if is_error && response.extensions().get::<CorrelationId>().is_none() {
        let mut headers = HeaderMap::new();
        if let Some(allow) = response.headers().get(header::ALLOW) {
            headers.insert(header::ALLOW, allow.clone());
        }
        response = HttpAppError::from(ProtocolError {
            status,
            detail: None,
            headers,
        })
        .into_response();
    }

    if let Some(CorrelationId(id)) = response.extensions().get::<CorrelationId>().copied() {
        Span::current().record("correlation_id", tracing::field::display(id));
        tracing::info!(
            correlation_id = %id,
            status = status.as_u16(),
            method = %method,
            path = %path,
            "Problem response"
        );
    }

    response
}

/// Render a handler panic as a 500 protocol problem.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %message, "Handler panicked");

    HttpAppError::protocol(StatusCode::INTERNAL_SERVER_ERROR, None).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::CORRELATION_ID_HEADER;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
            .route("/ok", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(correlation_middleware))
    }

    #[tokio::test]
    async fn test_bare_error_becomes_problem() {
        let response = app()
            .oneshot(Request::builder().uri("/teapot").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(response.headers().contains_key(&CORRELATION_ID_HEADER));
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            crate::problem::PROBLEM_JSON
        );
    }

    #[tokio::test]
    async fn test_method_mismatch_keeps_allow_header() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/ok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));
        assert!(response.headers().contains_key(&CORRELATION_ID_HEADER));
    }

    #[tokio::test]
    async fn test_success_untouched() {
        let response = app()
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(&CORRELATION_ID_HEADER));
    }
}
