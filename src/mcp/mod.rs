//! Model Context Protocol (MCP) Module
//!
//! This module contains the bridge between MCP clients and the tool registry:
//! - Protocol models (envelope, tagged requests, constants) and errors
//! - Envelope validation and response helpers
//! - Tool registry and the transport-independent dispatcher
//! - Transports: HTTP handlers with SSE sessions, and stdio

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod registry;
pub mod sse;
pub mod state;
pub mod stdio;

// Re-export commonly used types and functions
pub use dispatch::Bridge;
pub use error::McpError;
pub use handlers::routes;
pub use registry::{ToolContext, ToolHandler, ToolRegistry, ToolResult};
pub use state::{AppState, BridgeOptions, SharedState};
