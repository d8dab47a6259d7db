//! MCP Protocol Helpers
//!
//! This module contains helper functions for JSON-RPC communication:
//! envelope validation on the way in and response construction on the way out.

use super::error::McpError;
use super::models::{JsonRpcEnvelope, JsonRpcResponse, JSONRPC_VERSION};
use serde_json::Value;

/// Builds a JSON-RPC 2.0 success response.
///
/// # Arguments
///
/// * `id` – The request identifier that must be echoed back.
/// * `result` – The payload representing the successful outcome.
pub fn rpc_success(id: Value, result: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(id, result)
}

/// Builds a JSON-RPC 2.0 error response.
///
/// # Arguments
///
/// * `id` – The request identifier (or `null` if unavailable).
/// * `error` – The bridge error, mapped to its code, message and data.
pub fn rpc_error(id: Value, error: &McpError) -> JsonRpcResponse {
    JsonRpcResponse::failure(id, error.to_json_rpc_error())
}

/// A body that failed envelope validation, with whatever id could be salvaged.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeRejection {
    pub id: Value,
    pub error: McpError,
}

impl EnvelopeRejection {
    fn new(id: Value, detail: impl Into<String>) -> Self {
        Self {
            id,
            error: McpError::InvalidRequest(detail.into()),
        }
    }

    pub fn into_response(self) -> JsonRpcResponse {
        rpc_error(self.id, &self.error)
    }
}

/// Parses and validates a raw request body.
pub fn validate_envelope(raw: &[u8]) -> Result<JsonRpcEnvelope, EnvelopeRejection> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| EnvelopeRejection::new(Value::Null, format!("Body is not valid JSON: {}", e)))?;
    validate_value(value)
}

/// Applies the envelope rules, in order:
///
/// 1. the body is an object,
/// 2. `jsonrpc` is exactly `"2.0"`,
/// 3. `method` is a non-empty string,
/// 4. `id`, when present, is a string, a number or `null`.
pub fn validate_value(value: Value) -> Result<JsonRpcEnvelope, EnvelopeRejection> {
    let Value::Object(mut body) = value else {
        return Err(EnvelopeRejection::new(
            Value::Null,
            "The request body must be a JSON object",
        ));
    };

    let id = body.remove("id");
    let echo_id = match &id {
        Some(v @ (Value::String(_) | Value::Number(_))) => v.clone(),
        _ => Value::Null,
    };

    if body.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(EnvelopeRejection::new(
            echo_id,
            "The request does not conform to the JSON-RPC 2.0 specification",
        ));
    }

    if let Some(id) = &id {
        if !matches!(id, Value::String(_) | Value::Number(_) | Value::Null) {
            return Err(EnvelopeRejection::new(
                Value::Null,
                "The request id must be a string, a number or null",
            ));
        }
    }

    let method = match body.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => {
            return Err(EnvelopeRejection::new(
                echo_id,
                "The request method must be a non-empty string",
            ))
        }
    };

    Ok(JsonRpcEnvelope {
        method,
        params: body.remove("params"),
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::models::error_codes;
    use serde_json::json;

    #[test]
    fn test_rpc_envelopes() {
        let success = serde_json::to_value(rpc_success(json!(1), json!("ok"))).unwrap();
        assert_eq!(success["result"], "ok");
        assert_eq!(success["id"], 1);

        let error = serde_json::to_value(rpc_error(
            json!(2),
            &McpError::Internal("fail".into()),
        ))
        .unwrap();
        assert_eq!(error["error"]["message"], "Internal error");
        assert_eq!(error["error"]["data"], "fail");
        assert_eq!(error["id"], 2);
    }

    #[test]
    fn test_valid_envelope() {
        let envelope = validate_envelope(
            br#"{"jsonrpc":"2.0","method":"mcp.connect","id":"abc","params":{"a":1}}"#,
        )
        .unwrap();
        assert_eq!(envelope.method, "mcp.connect");
        assert_eq!(envelope.response_id(), json!("abc"));
        assert_eq!(envelope.params, Some(json!({ "a": 1 })));
    }

    #[test]
    fn test_absent_id_answers_as_null() {
        let envelope = validate_value(json!({ "jsonrpc": "2.0", "method": "ping" })).unwrap();
        assert_eq!(envelope.id, None);
        assert_eq!(envelope.response_id(), Value::Null);
        assert!(!envelope.is_notification());

        let note =
            validate_value(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
                .unwrap();
        assert!(note.is_notification());
    }

    #[test]
    fn test_explicit_null_id_is_kept() {
        let envelope =
            validate_value(json!({ "jsonrpc": "2.0", "method": "ping", "id": null })).unwrap();
        assert_eq!(envelope.id, Some(Value::Null));
    }

    #[test]
    fn test_rejections_are_invalid_request() {
        let cases = [
            json!([1, 2, 3]),
            json!("text"),
            json!({ "method": "ping", "id": 1 }),
            json!({ "jsonrpc": "1.0", "method": "ping", "id": 1 }),
            json!({ "jsonrpc": 2.0, "method": "ping", "id": 1 }),
            json!({ "jsonrpc": "2.0", "id": 1 }),
            json!({ "jsonrpc": "2.0", "method": "", "id": 1 }),
            json!({ "jsonrpc": "2.0", "method": 123, "id": 1 }),
            json!({ "jsonrpc": "2.0", "method": "ping", "id": { "nested": true } }),
        ];

        for case in cases {
            let rejection = validate_value(case.clone()).unwrap_err();
            assert_eq!(
                rejection.error.code(),
                error_codes::INVALID_REQUEST,
                "case: {case}"
            );
        }
    }

    #[test]
    fn test_rejection_echoes_usable_id() {
        let rejection =
            validate_value(json!({ "jsonrpc": "1.0", "method": "ping", "id": 7 })).unwrap_err();
        assert_eq!(rejection.id, json!(7));
    }

    #[test]
    fn test_unparseable_body() {
        let rejection = validate_envelope(b"invalid json {{{").unwrap_err();
        assert_eq!(rejection.id, Value::Null);
        assert_eq!(rejection.error.code(), error_codes::INVALID_REQUEST);
    }
}
