//! MCP (Model Context Protocol) route handlers
//!
//! HTTP surface of the bridge: JSON-RPC over POST, the SSE session on GET,
//! and a few read-only informational endpoints.

use super::error::McpError;
use super::helpers::rpc_error;
use super::models::JsonRpcResponse;
use super::sse::SseSession;
use super::state::SharedState;
use crate::statuspage::config::resolve;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, HeaderName},
    response::{sse::Sse, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Creates routes for MCP-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", post(handle_mcp))
        .route("/mcp", post(handle_mcp).get(handle_mcp_sse)) // Standard endpoint
        .route("/mcp/", post(handle_mcp).get(handle_mcp_sse)) // Trailing slash safety
        .route("/mcp/metadata", get(handle_metadata))
        .route("/tools", get(handle_tools))
        .route("/health", get(handle_health))
}

/// Endpoint: POST /mcp
///
/// Always answers 200 with a JSON-RPC envelope; protocol failures are
/// carried in the `error` member. The body is taken raw so that malformed
/// JSON reaches envelope validation, and a body that cannot be read at all
/// (over the size limit, or cut off) becomes an Invalid Request reply.
async fn handle_mcp(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Json<JsonRpcResponse> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Request body rejected"
            );
            let error = McpError::InvalidRequest(format!(
                "Request body could not be read: {}",
                rejection.body_text()
            ));
            return Json(rpc_error(Value::Null, &error));
        }
    };

    let config = resolve(state.bridge.base_config(), &headers);
    if config.page_id != state.bridge.base_config().page_id {
        debug!(page_id = %config.page_id, "Page id overridden by request header");
    }

    Json(state.bridge.handle_raw(&body, &config).await)
}

/// Endpoint: GET /mcp
///
/// Opens an SSE session. `Content-Type` and `Cache-Control` are set by
/// [`Sse`]; the rest keeps proxies from buffering or closing the stream.
async fn handle_mcp_sse(State(state): State<SharedState>) -> impl IntoResponse {
    let discovery = state
        .options
        .discovery_push
        .then(|| state.bridge.discovery_payload());
    let session = SseSession::open(
        state.sessions.clone(),
        state.options.heartbeat_interval,
        discovery,
    );

    (
        [
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(session),
    )
}

// =============================================================================
// Informational Endpoints
// =============================================================================

/// Endpoint: GET /mcp/metadata
async fn handle_metadata(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server_name": state.options.server_name,
        "version": state.options.server_version,
        "tools": state.bridge.registry().list(),
    }))
}

/// Endpoint: GET /tools
async fn handle_tools(State(state): State<SharedState>) -> Json<Value> {
    let names = state.bridge.registry().names();
    Json(json!({
        "status": "ok",
        "count": names.len(),
        "tools": names,
    }))
}

/// Endpoint: GET /health
async fn handle_health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.options.server_name,
        "version": state.options.server_version,
        "sse_sessions": state.sessions.active_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
