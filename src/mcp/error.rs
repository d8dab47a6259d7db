//! Bridge error taxonomy and its JSON-RPC mapping

use super::models::{error_codes, JsonRpcError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum McpError {
    #[error("Invalid Request")]
    InvalidRequest(String),

    #[error("Method not found")]
    MethodNotFound(String),

    #[error("Method not found")]
    ToolNotFound(String),

    #[error("Invalid params")]
    InvalidParams(String),

    #[error("Invalid params")]
    MissingCredentials(Vec<&'static str>),

    #[error("Internal error")]
    Internal(String),
}

impl McpError {
    /// JSON-RPC error code
    pub fn code(&self) -> i32 {
        match self {
            McpError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::ToolNotFound(_) => {
                error_codes::METHOD_NOT_FOUND
            }
            McpError::InvalidParams(_) | McpError::MissingCredentials(_) => {
                error_codes::INVALID_PARAMS
            }
            McpError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Diagnostic text carried in `error.data`
    pub fn data(&self) -> String {
        match self {
            McpError::InvalidRequest(detail)
            | McpError::InvalidParams(detail)
            | McpError::Internal(detail) => detail.clone(),
            McpError::MethodNotFound(method) => {
                format!("The requested method '{}' is not supported", method)
            }
            McpError::ToolNotFound(name) => {
                format!("The requested tool '{}' is not registered", name)
            }
            McpError::MissingCredentials(fields) => format!(
                "Missing status page credentials: {}. Provide them via environment or x-statuspage-* headers",
                fields.join(", ")
            ),
        }
    }

    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: Some(self.data()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(McpError::InvalidRequest(String::new()).code(), -32600);
        assert_eq!(McpError::MethodNotFound("m".into()).code(), -32601);
        assert_eq!(McpError::ToolNotFound("t".into()).code(), -32601);
        assert_eq!(McpError::InvalidParams(String::new()).code(), -32602);
        assert_eq!(McpError::MissingCredentials(vec!["pageId"]).code(), -32602);
        assert_eq!(McpError::Internal(String::new()).code(), -32603);
    }

    #[test]
    fn test_tool_not_found_names_the_tool() {
        let error = McpError::ToolNotFound("delete-everything".into()).to_json_rpc_error();
        assert_eq!(error.message, "Method not found");
        assert!(error.data.unwrap().contains("delete-everything"));
    }
}
