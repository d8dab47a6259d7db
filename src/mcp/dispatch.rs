//! Request dispatch
//!
//! Transport-independent core of the bridge: takes a raw JSON-RPC message
//! plus the configuration effective for it and produces the response.
//! Both the HTTP handler and the stdio loop go through [`Bridge`].

use super::error::McpError;
use super::helpers::{rpc_error, rpc_success, validate_envelope};
use super::models::{connect_descriptor, initialize_result, JsonRpcEnvelope, JsonRpcResponse, McpRequest};
use super::registry::{ToolContext, ToolRegistry};
use crate::statuspage::config::StatusPageConfig;
use futures_util::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shared request router over a read-only tool registry.
#[derive(Debug, Clone)]
pub struct Bridge {
    registry: Arc<ToolRegistry>,
    base_config: StatusPageConfig,
    http: reqwest::Client,
    streaming: bool,
}

impl Bridge {
    pub fn new(registry: ToolRegistry, base_config: StatusPageConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            base_config,
            http: reqwest::Client::new(),
            streaming: false,
        }
    }

    /// Marks the bridge as served alongside an SSE channel.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Replaces the HTTP client used for upstream calls.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Configuration read at startup; per-request overrides start from it.
    pub fn base_config(&self) -> &StatusPageConfig {
        &self.base_config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Validates and answers one raw message. Always yields a response;
    /// envelope failures are reported as `Invalid Request`.
    pub async fn handle_raw(&self, raw: &[u8], config: &StatusPageConfig) -> JsonRpcResponse {
        match validate_envelope(raw) {
            Ok(envelope) => self.handle(envelope, config).await,
            Err(rejection) => {
                warn!(error = %rejection.error.data(), "Rejected JSON-RPC envelope");
                rejection.into_response()
            }
        }
    }

    /// Like [`Bridge::handle_raw`], but id-less `notifications/*` messages
    /// are processed without producing a response.
    pub async fn handle_message(
        &self,
        raw: &[u8],
        config: &StatusPageConfig,
    ) -> Option<JsonRpcResponse> {
        let envelope = match validate_envelope(raw) {
            Ok(envelope) => envelope,
            Err(rejection) => {
                warn!(error = %rejection.error.data(), "Rejected JSON-RPC envelope");
                return Some(rejection.into_response());
            }
        };

        if envelope.is_notification() {
            let response = self.handle(envelope, config).await;
            if let Some(error) = response.error() {
                debug!(code = error.code, "Notification failed; no response sent");
            }
            return None;
        }

        Some(self.handle(envelope, config).await)
    }

    /// Answers a validated envelope.
    pub async fn handle(
        &self,
        envelope: JsonRpcEnvelope,
        config: &StatusPageConfig,
    ) -> JsonRpcResponse {
        let id = envelope.response_id();
        info!(method = %envelope.method, id = %id, "MCP call");

        let registry = &self.registry;
        let outcome = match McpRequest::parse(&envelope.method, envelope.params, |name| {
            registry.contains(name)
        }) {
            Ok(request) => self.dispatch(request, config).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => rpc_success(id, result),
            Err(e) => {
                warn!(method = %envelope.method, code = e.code(), detail = %e.data(), "MCP call failed");
                rpc_error(id, &e)
            }
        }
    }

    /// Routes a classified request to its handler.
    pub async fn dispatch(
        &self,
        request: McpRequest,
        config: &StatusPageConfig,
    ) -> Result<Value, McpError> {
        match request {
            McpRequest::Connect => Ok(connect_descriptor(self.streaming)),
            McpRequest::DiscoverTools => Ok(self.discovery_payload()),
            McpRequest::Initialize => Ok(initialize_result()),
            McpRequest::Initialized | McpRequest::Ping => Ok(json!({})),
            McpRequest::ListTools => Ok(self.tools_list_payload()),
            McpRequest::CallTool { name, arguments } | McpRequest::BareTool { name, arguments } => {
                self.call_tool(&name, arguments, config).await
            }
            McpRequest::Unknown(method) => Err(McpError::MethodNotFound(method)),
        }
    }

    // =========================================================================
    // Tools
    // =========================================================================

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        config: &StatusPageConfig,
    ) -> Result<Value, McpError> {
        let tool = self.registry.lookup(name)?;
        config.validate().map_err(McpError::MissingCredentials)?;

        let ctx = ToolContext::new(config.clone(), self.http.clone());
        let result = match AssertUnwindSafe(tool.handler.call(&ctx, arguments))
            .catch_unwind()
            .await
        {
            Ok(result) => result?,
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(tool = name, panic = %detail, "Tool handler panicked");
                return Err(McpError::Internal(format!("Tool '{}' failed: {}", name, detail)));
            }
        };

        if result.is_error {
            warn!(tool = name, "Tool reported an error");
        }
        serde_json::to_value(result).map_err(|e| McpError::Internal(e.to_string()))
    }

    /// Result of `mcp.discover_tools`
    pub fn discovery_payload(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .list()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    /// Result of `tools/list`
    pub fn tools_list_payload(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .list()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::models::error_codes;
    use crate::mcp::registry::{ToolError, ToolHandler, ToolResult};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, ctx: &ToolContext, arguments: Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::text(format!("{}:{}", ctx.config().page_id, arguments)))
        }
    }

    struct Explode;

    #[async_trait]
    impl ToolHandler for Explode {
        async fn call(&self, _ctx: &ToolContext, _arguments: Value) -> Result<ToolResult, ToolError> {
            panic!("kaboom");
        }
    }

    fn bridge() -> Bridge {
        let mut registry = ToolRegistry::new();
        registry.register("echo", "Echoes arguments", json!({ "type": "object" }), Echo);
        registry.register("explode", "Always panics", json!({}), Explode);
        Bridge::new(registry, StatusPageConfig::new("key", "page"))
    }

    async fn call(bridge: &Bridge, body: Value, config: &StatusPageConfig) -> Value {
        let raw = serde_json::to_vec(&body).unwrap();
        serde_json::to_value(bridge.handle_raw(&raw, config).await).unwrap()
    }

    #[tokio::test]
    async fn test_discovery_and_tools_list_shapes() {
        let bridge = bridge();
        let discovered = bridge.discovery_payload();
        assert_eq!(discovered["tools"][0]["name"], "echo");
        assert_eq!(discovered["tools"][0]["parameters"]["type"], "object");

        let listed = bridge.tools_list_payload();
        assert_eq!(listed["tools"][0]["inputSchema"]["type"], "object");
        assert_eq!(listed["tools"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_call_tool_uses_effective_config() {
        let bridge = bridge();
        let config = StatusPageConfig::new("other-key", "other-page");
        let response = call(
            &bridge,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "mcp.call_tool",
                "params": { "name": "echo", "params": { "x": 1 } }
            }),
            &config,
        )
        .await;

        assert_eq!(
            response["result"]["content"][0]["text"],
            r#"other-page:{"x":1}"#
        );
        assert_eq!(bridge.base_config().page_id, "page");
    }

    #[tokio::test]
    async fn test_unknown_tool_checked_before_credentials() {
        let bridge = bridge();
        let response = call(
            &bridge,
            json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": { "name": "missing" }
            }),
            &StatusPageConfig::default(),
        )
        .await;
        assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_credentials_reject_tool_call() {
        let bridge = bridge();
        let config = StatusPageConfig::new("", "page");
        let response = call(
            &bridge,
            json!({ "jsonrpc": "2.0", "id": 3, "method": "echo" }),
            &config,
        )
        .await;
        assert_eq!(response["error"]["code"], error_codes::INVALID_PARAMS);
        assert!(response["error"]["data"]
            .as_str()
            .unwrap()
            .contains("apiKey"));
    }

    #[tokio::test]
    async fn test_panicking_tool_becomes_internal_error() {
        let bridge = bridge();
        let response = call(
            &bridge,
            json!({
                "jsonrpc": "2.0", "id": "p", "method": "mcp.call_tool",
                "params": { "name": "explode" }
            }),
            bridge.base_config(),
        )
        .await;
        assert_eq!(response["id"], "p");
        assert_eq!(response["error"]["code"], error_codes::INTERNAL_ERROR);
        assert!(response["error"]["data"].as_str().unwrap().contains("kaboom"));

        // The bridge keeps serving afterwards.
        let ping = call(
            &bridge,
            json!({ "jsonrpc": "2.0", "id": 4, "method": "ping" }),
            bridge.base_config(),
        )
        .await;
        assert_eq!(ping["result"], json!({}));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let bridge = bridge();
        let response = call(
            &bridge,
            json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" }),
            bridge.base_config(),
        )
        .await;
        assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);
        assert!(response["error"]["data"]
            .as_str()
            .unwrap()
            .contains("resources/list"));
    }

    #[tokio::test]
    async fn test_notifications_get_no_message_response() {
        let bridge = bridge();
        let config = bridge.base_config().clone();

        let none = bridge
            .handle_message(
                br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                &config,
            )
            .await;
        assert!(none.is_none());

        let answered = bridge
            .handle_message(br#"{"jsonrpc":"2.0","method":"ping"}"#, &config)
            .await
            .unwrap();
        assert_eq!(answered.id, Value::Null);
        assert!(answered.result().is_some());
    }
}
