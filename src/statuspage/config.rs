//! Status page credentials and per-request resolution
//!
//! The base configuration is read once from the environment at startup and
//! never mutated afterwards. Each HTTP request derives its own effective
//! configuration from that base plus any `x-statuspage-*` headers it carries,
//! so concurrent callers with different credentials cannot observe each
//! other's overrides.

use axum::http::HeaderMap;
use tracing::{info, warn};

// =============================================================================
// Constants
// =============================================================================

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "STATUSPAGE_API_KEY";
/// Environment variable holding the page identifier
pub const PAGE_ID_ENV: &str = "STATUSPAGE_PAGE_ID";
/// Environment variable holding the comma-separated default component ids
pub const DEFAULT_COMPONENTS_ENV: &str = "STATUSPAGE_DEFAULT_COMPONENTS";
/// Environment variable overriding the upstream API base URL
pub const API_BASE_ENV: &str = "STATUSPAGE_API_BASE";

/// Request header overriding the API key
pub const API_KEY_HEADER: &str = "x-statuspage-api-key";
/// Request header overriding the page identifier
pub const PAGE_ID_HEADER: &str = "x-statuspage-page-id";
/// Request header overriding the default component ids
pub const DEFAULT_COMPONENTS_HEADER: &str = "x-statuspage-default-components";

/// Public status page API
pub const DEFAULT_API_BASE: &str = "https://api.statuspage.io/v1";

// =============================================================================
// Configuration
// =============================================================================

/// Credentials and defaults used by the tool handlers for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPageConfig {
    /// API key sent as the `Authorization: OAuth <key>` header
    pub api_key: String,

    /// Page identifier, part of every upstream URL
    pub page_id: String,

    /// Components offered first when an incident needs component selection
    pub default_component_ids: Vec<String>,

    /// Upstream base URL (without the `/pages/{id}` suffix)
    pub api_base: String,
}

impl Default for StatusPageConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            page_id: String::new(),
            default_component_ids: Vec::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl StatusPageConfig {
    /// Builds a configuration with explicit credentials and the public API base.
    pub fn new(api_key: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            page_id: page_id.into(),
            ..Self::default()
        }
    }

    /// Points the configuration at a different upstream (used by tests and proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the default component ids.
    pub fn with_default_components(mut self, ids: Vec<String>) -> Self {
        self.default_component_ids = ids;
        self
    }

    /// Reads the base configuration from the process environment.
    ///
    /// Missing variables yield empty values; validation happens per call.
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).unwrap_or_default();

        let api_base = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            api_key: read(API_KEY_ENV).trim().to_string(),
            page_id: read(PAGE_ID_ENV).trim().to_string(),
            default_component_ids: parse_component_list(&read(DEFAULT_COMPONENTS_ENV)),
            api_base,
        }
    }

    /// Names of the required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() {
            missing.push("apiKey");
        }
        if self.page_id.trim().is_empty() {
            missing.push("pageId");
        }
        missing
    }

    /// Both the API key and the page id must be non-empty.
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// API key with everything but the first and last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let key = &self.api_key;
        if key.is_empty() {
            return "undefined".to_string();
        }
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }

    /// Logs the configuration at startup without exposing the API key.
    pub fn log_summary(&self) {
        info!(
            page_id = %self.page_id,
            api_key = %self.masked_api_key(),
            default_components = %self.default_component_ids.join(", "),
            api_base = %self.api_base,
            "Status page configuration loaded"
        );

        for field in self.missing_fields() {
            warn!(
                field,
                "Status page credential missing; tool calls need it from the environment or request headers"
            );
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Splits a comma-separated component list, trimming blanks.
pub fn parse_component_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derives the effective configuration for one request.
///
/// Recognized headers replace the corresponding base value; absent or blank
/// headers leave it untouched. The base is never modified.
pub fn resolve(base: &StatusPageConfig, headers: &HeaderMap) -> StatusPageConfig {
    let mut effective = base.clone();

    if let Some(api_key) = header_value(headers, API_KEY_HEADER) {
        effective.api_key = api_key;
    }
    if let Some(page_id) = header_value(headers, PAGE_ID_HEADER) {
        effective.page_id = page_id;
    }
    if let Some(components) = header_value(headers, DEFAULT_COMPONENTS_HEADER) {
        effective.default_component_ids = parse_component_list(&components);
    }

    effective
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
