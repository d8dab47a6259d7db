//! Status Page MCP Bridge Library
//!
//! This library exposes status page incident and component tools to MCP
//! clients over HTTP (JSON-RPC POST plus SSE) or stdio.

// Domain modules
pub mod mcp;
pub mod statuspage;

// Infrastructure
pub mod router;
