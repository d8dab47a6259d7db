//! Routing module for the status page bridge

use crate::mcp::state::SharedState;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Methods advertised to browsers
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
/// How long a preflight answer may be cached
const PREFLIGHT_MAX_AGE_SECS: u64 = 86_400;
/// Largest JSON-RPC body accepted; larger ones get an Invalid Request reply
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Creates and configures the application router with all routes and middleware
pub fn create_app_router(state: SharedState) -> Router {
    // Middleware: CORS headers on regular responses
    let allowed_headers: Vec<HeaderName> = state
        .options
        .cors_headers
        .iter()
        .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
        .collect();
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers)
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS));

    // Routes
    Router::new()
        .merge(crate::mcp::routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(log_requests))
        .layer(cors_layer)
        .layer(middleware::from_fn_with_state(state.clone(), answer_preflight))
        .with_state(state)
}

/// Middleware: Log requests
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    info!(%method, %uri, "REQ");

    let res = next.run(req).await;
    if !res.status().is_success() {
        warn!(%method, %uri, status = %res.status(), "RES (Error)");
    }
    res
}

/// Middleware: answers every `OPTIONS` request with 204 and the permissive
/// CORS headers, whatever the path.
async fn answer_preflight(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }

    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS.to_string()),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, state.options.allow_headers()),
            (header::ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE_SECS.to_string()),
        ],
    )
        .into_response()
}
