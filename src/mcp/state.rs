//! Bridge State Management
//!
//! State shared by the HTTP handlers: the dispatcher, the open SSE sessions
//! and the options that distinguish one deployment of the bridge from another.

use super::dispatch::Bridge;
use super::models::{SERVER_NAME, SERVER_VERSION};
use super::sse::{SessionTracker, SharedSessionTracker, DEFAULT_HEARTBEAT_INTERVAL};
use crate::statuspage::config::{API_KEY_HEADER, DEFAULT_COMPONENTS_HEADER, PAGE_ID_HEADER};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Bridge Options
// =============================================================================

/// Variation points of the HTTP bridge
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Interval between SSE heartbeat comments
    pub heartbeat_interval: Duration,

    /// Push the tool listing on every new SSE session
    pub discovery_push: bool,

    /// Request headers allowed by CORS preflight
    pub cors_headers: Vec<String>,

    /// Name reported by metadata and health endpoints
    pub server_name: String,

    /// Version reported by metadata and health endpoints
    pub server_version: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            discovery_push: true,
            cors_headers: ["Content-Type", "Authorization"]
                .into_iter()
                .chain([API_KEY_HEADER, PAGE_ID_HEADER, DEFAULT_COMPONENTS_HEADER])
                .map(str::to_string)
                .collect(),
            server_name: SERVER_NAME.to_string(),
            server_version: SERVER_VERSION.to_string(),
        }
    }
}

impl BridgeOptions {
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_discovery_push(mut self, enabled: bool) -> Self {
        self.discovery_push = enabled;
        self
    }

    /// Value of `Access-Control-Allow-Headers`
    pub fn allow_headers(&self) -> String {
        self.cors_headers.join(", ")
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

pub struct AppState {
    /// Dispatcher and the startup configuration
    pub bridge: Arc<Bridge>,

    /// Open SSE sessions
    pub sessions: SharedSessionTracker,

    pub options: BridgeOptions,
}

impl AppState {
    pub fn new(bridge: Bridge, options: BridgeOptions) -> Self {
        Self {
            bridge: Arc::new(bridge),
            sessions: Arc::new(SessionTracker::new()),
            options,
        }
    }
}
