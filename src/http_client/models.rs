//! Wire shapes returned by the HTTP collaborator.
//!
//! The collaborator speaks snake_case and its own severity vocabulary;
//! these types decode that and convert into the console's domain model.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::timestamp;
use crate::domain::{Camera, CameraStatus, EntityId, Event, Severity};

/// Camera row from `GET /api/cameras`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiCamera {
    /// Camera id.
    pub id: EntityId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the camera is enabled; drives the derived status.
    #[serde(default)]
    pub enabled: bool,
    /// Resolution string, when reported.
    #[serde(default)]
    pub resolution: Option<String>,
}

impl From<ApiCamera> for Camera {
    fn from(api: ApiCamera) -> Self {
        Self {
            id: api.id,
            name: api.name,
            status: CameraStatus::from_enabled(api.enabled),
            resolution: api.resolution,
            enabled: Some(api.enabled),
        }
    }
}

/// Event row from `GET /api/events`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEvent {
    /// Event id.
    #[serde(default)]
    pub id: Option<EntityId>,
    /// Event type.
    #[serde(default)]
    pub event_type: Option<String>,
    /// Upstream severity (`critical`, `warn`, …).
    #[serde(default)]
    pub severity: Option<String>,
    /// Name of the originating camera.
    #[serde(default)]
    pub camera_name: Option<String>,
    /// When the event happened.
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub ts: Option<DateTime<Utc>>,
    /// Raw payload stored with the event.
    #[serde(default)]
    pub payload_json: Option<serde_json::Value>,
}

impl From<ApiEvent> for Event {
    fn from(api: ApiEvent) -> Self {
        Self {
            id: api.id,
            event_type: api.event_type,
            detection_type: None,
            severity: api
                .severity
                .as_deref()
                .map_or(Severity::Low, Severity::from_upstream),
            camera_id: None,
            camera_name: api.camera_name,
            timestamp: api.ts,
            confidence: None,
            zones: Vec::new(),
            tags: Vec::new(),
            metadata: None,
            payload: api.payload_json,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiHealth {
    /// Backend health string (e.g. `ok`).
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disabled_camera_is_offline() {
        let Ok(api) = serde_json::from_value::<ApiCamera>(
            json!({"id": 3, "name": "Garage", "enabled": false, "resolution": "640x480"}),
        ) else {
            panic!("camera must decode");
        };
        let camera = Camera::from(api);
        assert_eq!(camera.id.as_str(), "3");
        assert_eq!(camera.status, CameraStatus::Offline);
        assert_eq!(camera.enabled, Some(false));
    }

    #[test]
    fn event_row_is_normalized() {
        let Ok(api) = serde_json::from_value::<ApiEvent>(json!({
            "id": 12,
            "event_type": "intrusion",
            "severity": "warn",
            "camera_name": "Porch",
            "ts": "2024-06-10T08:00:00Z",
            "payload_json": {"zone": "porch"},
        })) else {
            panic!("event must decode");
        };
        let event = Event::from(api);
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.event_type.as_deref(), Some("intrusion"));
        assert_eq!(event.camera_name.as_deref(), Some("Porch"));
        assert!(event.timestamp.is_some());
        assert_eq!(event.payload, Some(json!({"zone": "porch"})));
    }

    #[test]
    fn upstream_high_is_not_high() {
        let Ok(api) = serde_json::from_value::<ApiEvent>(json!({"id": 1, "severity": "high"}))
        else {
            panic!("event must decode");
        };
        assert_eq!(Event::from(api).severity, Severity::Low);
    }
}
