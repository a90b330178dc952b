//! Incidents raised by the server-side rule engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::timestamp;

/// An incident as delivered on `security/incidents/*` or
/// `GET /api/events/incidents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Incident id; updates are matched against it.
    #[serde(default)]
    pub id: Option<EntityId>,
    /// Camera the incident relates to.
    #[serde(default, alias = "camera_id")]
    pub camera_id: Option<EntityId>,
    /// Workflow status (`open`, `acknowledged`, `resolved`, …).
    #[serde(default)]
    pub status: Option<String>,
    /// When the incident was raised or last changed.
    #[serde(default, alias = "ts", deserialize_with = "timestamp::deserialize_opt")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Every other field, kept verbatim.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl Incident {
    /// Creates an incident with the given id and status.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, status: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            camera_id: None,
            status: Some(status.into()),
            timestamp: None,
            details: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_snake_and_camel_case() {
        let raw = json!({"id": 9, "camera_id": "cam-3", "status": "open", "title": "Forced entry"});
        let Ok(incident) = serde_json::from_value::<Incident>(raw) else {
            panic!("incident must decode");
        };
        assert_eq!(incident.id, Some(EntityId::from(9_u64)));
        assert_eq!(incident.camera_id, Some(EntityId::new("cam-3")));
        assert_eq!(incident.details.get("title"), Some(&json!("Forced entry")));
    }
}
