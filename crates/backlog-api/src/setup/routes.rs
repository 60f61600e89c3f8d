//! Route configuration and setup

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::middleware::{
    correlation_middleware, make_request_span, panic_response, security_headers_middleware,
};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the raw image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes and the middleware stack
pub fn setup_routes(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let body_limit = config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let http_concurrency_limit = config.http_concurrency_limit.max(1);
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        body_limit_bytes = body_limit,
        request_timeout_secs = config.request_timeout_secs,
        "HTTP limits configured"
    );

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route(
            "/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route(
            "/items/{id}",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route(
            "/items/{id}/images",
            post(handlers::uploads::upload_item_image),
        )
        .route("/uploads", post(handlers::uploads::upload_image))
        .fallback(handlers::not_found)
        // Layers run bottom-up on the way in: headers, tracing and correlation wrap
        // everything below, so limit/timeout/panic responses are rendered as problems.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn(correlation_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state)
}
