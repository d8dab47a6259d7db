//! Status Page Domain Models
//!
//! Wire types exchanged with the upstream status page API and the argument
//! types accepted by the incident tools.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Enumerations
// =============================================================================

/// Lifecycle status of an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Monitoring,
    Resolved,
}

impl IncidentStatus {
    pub const ALL: [&'static str; 4] = ["investigating", "identified", "monitoring", "resolved"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investigating => "investigating",
            Self::Identified => "identified",
            Self::Monitoring => "monitoring",
            Self::Resolved => "resolved",
        }
    }
}

/// Impact level of an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentImpact {
    Critical,
    Major,
    Minor,
    Maintenance,
}

impl IncidentImpact {
    pub const ALL: [&'static str; 4] = ["critical", "major", "minor", "maintenance"];
}

/// Operational status of a single component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
    UnderMaintenance,
}

impl ComponentStatus {
    pub const ALL: [&'static str; 5] = [
        "operational",
        "degraded_performance",
        "partial_outage",
        "major_outage",
        "under_maintenance",
    ];
}

// =============================================================================
// Upstream Resources
// =============================================================================

/// Component reference embedded in an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentComponent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Incident as returned by the upstream API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub shortlink: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub components: Option<Vec<IncidentComponent>>,
}

/// Component as returned by the upstream API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub group_id: Option<String>,
}

// =============================================================================
// Upstream Request Bodies
// =============================================================================

/// Fields of an incident create or update; unset fields are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncidentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<IncidentImpact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Component id to new component status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, ComponentStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver_notifications: Option<bool>,
}

/// `{ "incident": { ... } }` wrapper expected by the upstream API
#[derive(Debug, Serialize)]
pub struct IncidentEnvelope<'a> {
    pub incident: &'a IncidentPayload,
}

fn component_map(components: &[ComponentUpdate]) -> Option<BTreeMap<String, ComponentStatus>> {
    if components.is_empty() {
        return None;
    }
    Some(
        components
            .iter()
            .map(|c| (c.id.clone(), c.status))
            .collect(),
    )
}

impl IncidentPayload {
    /// Full body for a new incident.
    pub fn for_create(input: &CreateIncidentInput) -> Self {
        Self {
            name: Some(input.name.clone()),
            status: Some(input.status),
            impact: Some(input.impact),
            body: Some(input.message.clone()),
            components: input.components.as_deref().and_then(component_map),
            deliver_notifications: Some(input.notify),
        }
    }

    /// Partial body carrying only the fields the caller supplied.
    pub fn for_update(input: &UpdateIncidentInput) -> Self {
        Self {
            name: non_empty(&input.name),
            status: input.status,
            impact: input.impact,
            body: non_empty(&input.message),
            components: input.components.as_deref().and_then(component_map),
            deliver_notifications: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

// =============================================================================
// Tool Arguments
// =============================================================================

fn default_notify() -> bool {
    true
}

/// A component and the status it should move to
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentUpdate {
    pub id: String,
    pub status: ComponentStatus,
}

/// Input for the create-incident tool
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIncidentInput {
    pub name: String,
    pub status: IncidentStatus,
    pub impact: IncidentImpact,
    pub message: String,
    /// Whether subscribers are notified (defaults to true)
    #[serde(default = "default_notify")]
    pub notify: bool,
    pub components: Option<Vec<ComponentUpdate>>,
}

/// Input for the update-incident tool
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncidentInput {
    pub incident_id: String,
    pub status: Option<IncidentStatus>,
    pub impact: Option<IncidentImpact>,
    pub message: Option<String>,
    pub name: Option<String>,
    pub components: Option<Vec<ComponentUpdate>>,
}

impl UpdateIncidentInput {
    /// True when any incident field other than components is being changed.
    pub fn has_field_changes(&self) -> bool {
        self.status.is_some()
            || self.impact.is_some()
            || self.message.as_deref().is_some_and(|m| !m.is_empty())
            || self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// True when the update would send at least one mutating field upstream.
    pub fn has_changes(&self) -> bool {
        self.has_field_changes() || self.components.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Input for the get-incident tool
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIncidentInput {
    pub incident_id: String,
}

/// Input for the list-incidents tool
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListIncidentsInput {
    pub status: Option<IncidentStatus>,
    pub limit: Option<u32>,
}

/// Input for the list-components tool; the placeholder is accepted and ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListComponentsInput {
    pub random_string: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_payload_shape() {
        let input: CreateIncidentInput = serde_json::from_value(json!({
            "name": "API down",
            "status": "investigating",
            "impact": "major",
            "message": "Looking into it",
            "components": [{ "id": "cmp1", "status": "major_outage" }]
        }))
        .unwrap();

        let body = serde_json::to_value(IncidentEnvelope {
            incident: &IncidentPayload::for_create(&input),
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "incident": {
                    "name": "API down",
                    "status": "investigating",
                    "impact": "major",
                    "body": "Looking into it",
                    "components": { "cmp1": "major_outage" },
                    "deliver_notifications": true
                }
            })
        );
    }

    #[test]
    fn test_update_payload_is_partial() {
        let input: UpdateIncidentInput = serde_json::from_value(json!({
            "incidentId": "inc1",
            "status": "resolved",
            "message": ""
        }))
        .unwrap();

        let body = serde_json::to_value(IncidentPayload::for_update(&input)).unwrap();
        assert_eq!(body, json!({ "status": "resolved" }));
    }

    #[test]
    fn test_update_change_detection() {
        let only_id: UpdateIncidentInput =
            serde_json::from_value(json!({ "incidentId": "inc1" })).unwrap();
        assert!(!only_id.has_field_changes());
        assert!(!only_id.has_changes());

        let empty_components: UpdateIncidentInput =
            serde_json::from_value(json!({ "incidentId": "inc1", "components": [] })).unwrap();
        assert!(!empty_components.has_changes());

        let with_components: UpdateIncidentInput = serde_json::from_value(json!({
            "incidentId": "inc1",
            "components": [{ "id": "c", "status": "operational" }]
        }))
        .unwrap();
        assert!(with_components.has_changes());
    }

    #[test]
    fn test_rejects_unknown_enum_values() {
        let result: Result<CreateIncidentInput, _> = serde_json::from_value(json!({
            "name": "x",
            "status": "panicking",
            "impact": "minor",
            "message": "m"
        }));
        assert!(result.is_err());
    }
}
