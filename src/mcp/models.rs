//! MCP Protocol Models and Constants
//!
//! This module contains the JSON-RPC envelope types and the tagged request
//! model the dispatcher works on.

use super::error::McpError;
use serde::Serialize;
use serde_json::{json, Map, Value};

// =============================================================================
// MCP Constants
// =============================================================================

/// Server identifier
pub const SERVER_NAME: &str = "Status Page Manager MCP";
/// Server version reported in handshakes
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Protocol version for the standard MCP handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";
/// Version reported by the `mcp.connect` / `mcp.ready` dialect
pub const BRIDGE_PROTOCOL_VERSION: &str = "1.0";
/// The only accepted `jsonrpc` value
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error codes
pub mod error_codes {
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Method names understood by the router
pub mod methods {
    pub const CONNECT: &str = "mcp.connect";
    pub const DISCOVER_TOOLS: &str = "mcp.discover_tools";
    pub const CALL_TOOL: &str = "mcp.call_tool";
    pub const READY: &str = "mcp.ready";
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const PING: &str = "ping";
}

// =============================================================================
// MCP Protocol Models
// =============================================================================

/// A validated JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcEnvelope {
    /// Method name to invoke (never empty)
    pub method: String,

    /// Parameters for the method
    pub params: Option<Value>,

    /// Request identifier; `None` when the field was absent
    pub id: Option<Value>,
}

impl JsonRpcEnvelope {
    /// The id echoed in the response; an absent id answers as `null`.
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    /// Id-less message in the `notifications/` namespace.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with("notifications/")
    }
}

/// Error object of a JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Exactly one of `result` or `error`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(JsonRpcError),
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: ResponsePayload::Error(error),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(error) => Some(error),
        }
    }
}

// =============================================================================
// Request Model
// =============================================================================

/// One variant per recognized method, built at the boundary so the
/// dispatcher never inspects raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum McpRequest {
    /// `mcp.connect`
    Connect,
    /// `mcp.discover_tools`
    DiscoverTools,
    /// `initialize`
    Initialize,
    /// `notifications/initialized`
    Initialized,
    /// `tools/list`
    ListTools,
    /// `ping`
    Ping,
    /// `mcp.call_tool` (arguments from `params.params`) or `tools/call`
    /// (arguments from `params.arguments`)
    CallTool { name: String, arguments: Value },
    /// Method name equal to a registered tool; arguments are `params` itself
    BareTool { name: String, arguments: Value },
    /// Anything else
    Unknown(String),
}

impl McpRequest {
    /// Classifies a method. Namespaced and standard forms win over the
    /// bare tool-name form.
    pub fn parse(
        method: &str,
        params: Option<Value>,
        is_registered_tool: impl Fn(&str) -> bool,
    ) -> Result<Self, McpError> {
        let request = match method {
            methods::CONNECT => Self::Connect,
            methods::DISCOVER_TOOLS => Self::DiscoverTools,
            methods::INITIALIZE => Self::Initialize,
            methods::INITIALIZED => Self::Initialized,
            methods::TOOLS_LIST => Self::ListTools,
            methods::PING => Self::Ping,
            methods::CALL_TOOL => Self::call_tool(params, "params")?,
            methods::TOOLS_CALL => Self::call_tool(params, "arguments")?,
            other if is_registered_tool(other) => Self::BareTool {
                name: other.to_string(),
                arguments: arguments_or_empty(params),
            },
            other => Self::Unknown(other.to_string()),
        };
        Ok(request)
    }

    fn call_tool(params: Option<Value>, arguments_field: &str) -> Result<Self, McpError> {
        let mut params = match params {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(McpError::InvalidParams(
                    "Missing tool name in call_tool request".to_string(),
                ))
            }
        };

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                McpError::InvalidParams("Missing tool name in call_tool request".to_string())
            })?;

        Ok(Self::CallTool {
            name,
            arguments: arguments_or_empty(params.remove(arguments_field)),
        })
    }
}

fn arguments_or_empty(arguments: Option<Value>) -> Value {
    match arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    }
}

/// Capability descriptor returned by `mcp.connect`; `streaming` is set when
/// the transport also offers an SSE channel.
pub fn connect_descriptor(streaming: bool) -> Value {
    json!({
        "streaming": streaming,
        "version": BRIDGE_PROTOCOL_VERSION,
        "name": SERVER_NAME,
        "formats": ["json"],
        "capabilities": ["tool_discovery", "tool_execution"]
    })
}

/// Result of the standard `initialize` handshake
pub fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}
