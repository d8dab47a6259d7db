//! Tool registry
//!
//! Explicit mapping from tool name to description, parameter schema and
//! handler. Populated once at startup; read-only afterwards.

use super::error::McpError;
use crate::statuspage::client::StatusPageClient;
use crate::statuspage::config::StatusPageConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Tool Results
// =============================================================================

/// One content item of a tool result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Output of a tool handler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,

    /// Set for tool-level failures (e.g. the upstream API rejected the call)
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error_text(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// Single text item holding `value` as compact JSON.
    pub fn json(value: &Value) -> Self {
        Self::text(value.to_string())
    }

    pub fn json_error(value: &Value) -> Self {
        Self::error_text(value.to_string())
    }

    /// Concatenated text of all content items
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|ToolContent::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Failures that escape a handler and become JSON-RPC errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Internal(String),
}

impl From<ToolError> for McpError {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::InvalidArguments(_) => McpError::InvalidParams(error.to_string()),
            ToolError::Internal(detail) => McpError::Internal(detail),
        }
    }
}

/// Deserializes tool arguments, mapping failures to `InvalidArguments`.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

// =============================================================================
// Handler Context
// =============================================================================

/// Everything a handler needs for one call, resolved for that call only.
#[derive(Debug, Clone)]
pub struct ToolContext {
    config: StatusPageConfig,
    client: StatusPageClient,
}

impl ToolContext {
    pub fn new(config: StatusPageConfig, http: reqwest::Client) -> Self {
        let client = StatusPageClient::new(http, &config);
        Self { config, client }
    }

    pub fn config(&self) -> &StatusPageConfig {
        &self.config
    }

    pub fn client(&self) -> &StatusPageClient {
        &self.client
    }
}

/// Body of a tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &ToolContext, arguments: Value) -> Result<ToolResult, ToolError>;
}

// =============================================================================
// Registry
// =============================================================================

/// A registered tool
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: Value,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Discovery view of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. Registering an existing name replaces the earlier entry
    /// in place, so the listing order is that of first registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        handler: impl ToolHandler + 'static,
    ) {
        let descriptor = ToolDescriptor {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Arc::new(handler),
        };

        match self.index.get(&descriptor.name) {
            Some(&position) => self.tools[position] = descriptor,
            None => {
                self.index.insert(descriptor.name.clone(), self.tools.len());
                self.tools.push(descriptor);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor, McpError> {
        self.index
            .get(name)
            .map(|&position| &self.tools[position])
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All tools in registration order
    pub fn list(&self) -> Vec<ToolSummary> {
        self.tools
            .iter()
            .map(|tool| ToolSummary {
                name: tool.name.clone(),
                description: tool.description.clone(),
                schema: tool.schema.clone(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
