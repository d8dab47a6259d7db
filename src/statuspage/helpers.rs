//! Status Page Result Helpers
//!
//! Small, pure functions that shape upstream resources into the JSON text
//! returned by the tools.

use super::models::{Component, ComponentStatus, Incident};
use crate::mcp::registry::ToolResult;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Display;

/// Incident fields exposed by the get/list tools
#[derive(Debug, Clone, Serialize)]
pub struct IncidentSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub status: &'a str,
    pub impact: &'a str,
    pub created_at: Option<&'a str>,
    pub updated_at: Option<&'a str>,
    pub shortlink: Option<&'a str>,
}

impl<'a> From<&'a Incident> for IncidentSummary<'a> {
    fn from(incident: &'a Incident) -> Self {
        Self {
            id: &incident.id,
            name: &incident.name,
            status: &incident.status,
            impact: &incident.impact,
            created_at: incident.created_at.as_deref(),
            updated_at: incident.updated_at.as_deref(),
            shortlink: incident.shortlink.as_deref(),
        }
    }
}

/// Component fields exposed by list-components
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub status: &'a str,
    pub description: Option<&'a str>,
}

impl<'a> From<&'a Component> for ComponentSummary<'a> {
    fn from(component: &'a Component) -> Self {
        Self {
            id: &component.id,
            name: &component.name,
            status: &component.status,
            description: component.description.as_deref(),
        }
    }
}

/// Component entry offered when the caller must pick components
#[derive(Debug, Clone, Serialize)]
pub struct SelectableComponent<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub current_status: &'a str,
}

/// Tool-level failure: `{success: false, error}` with `isError` set.
pub fn failure(error: impl Display) -> ToolResult {
    ToolResult::json_error(&json!({
        "success": false,
        "error": error.to_string(),
    }))
}

/// Restricts `components` to the configured defaults, unless none are
/// configured or none of them exist on the page.
pub fn preferred_components<'a>(
    components: &'a [Component],
    default_ids: &[String],
) -> Vec<&'a Component> {
    let preferred: Vec<&Component> = components
        .iter()
        .filter(|c| default_ids.iter().any(|id| id == &c.id))
        .collect();

    if preferred.is_empty() {
        components.iter().collect()
    } else {
        preferred
    }
}

/// Asks the caller to choose components (and, for updates, fields) before
/// anything is written upstream.
pub fn component_selection(
    components: &[Component],
    default_ids: &[String],
    incident: Option<&Incident>,
) -> ToolResult {
    let available: Vec<SelectableComponent> = preferred_components(components, default_ids)
        .into_iter()
        .map(|c| SelectableComponent {
            id: &c.id,
            name: &c.name,
            current_status: &c.status,
        })
        .collect();

    let mut payload = json!({
        "needs_component_selection": true,
        "available_components": available,
        "available_statuses": ComponentStatus::ALL,
    });

    match incident {
        Some(incident) => {
            payload["message"] = Value::from(
                "Please select what you want to update for this incident. Available components:",
            );
            payload["incident_details"] = json!({
                "id": incident.id,
                "name": incident.name,
                "status": incident.status,
                "impact": incident.impact,
            });
        }
        None => {
            payload["message"] =
                Value::from("Please select components and their status for this incident.");
        }
    }

    ToolResult::json(&payload)
}
