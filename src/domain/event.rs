//! Security events, detections and severity normalization.
//!
//! Upstream producers use a richer severity vocabulary (`critical`, `warn`,
//! `info`, …). The console collapses it into three levels with a total
//! mapping: `critical → high`, `warn → medium`, anything else `→ low`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::EntityId;
use super::timestamp;

/// Normalized event severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Upstream `critical`.
    High,
    /// Upstream `warn`.
    Medium,
    /// Everything else, including a missing severity.
    #[default]
    Low,
}

impl Severity {
    /// Maps an upstream severity string onto the normalized scale.
    #[must_use]
    pub fn from_upstream(raw: &str) -> Self {
        match raw {
            "critical" => Self::High,
            "warn" => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Serde adapter normalizing an upstream severity field.
    ///
    /// Missing, null or non-string values map to [`Severity::Low`].
    ///
    /// # Errors
    ///
    /// Only propagates structural deserializer errors.
    pub fn deserialize_upstream<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map_or(Self::Low, Self::from_upstream))
    }
}

/// A security event as delivered on `security/events/*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id; updates are matched against it.
    #[serde(default)]
    pub id: Option<EntityId>,
    /// Event type (`type`, `eventType` or `event_type` upstream).
    #[serde(default, rename = "type", alias = "eventType", alias = "event_type")]
    pub event_type: Option<String>,
    /// Detector-specific type, preferred over `event_type` for analyses.
    #[serde(default)]
    pub detection_type: Option<String>,
    /// Normalized severity.
    #[serde(default, deserialize_with = "Severity::deserialize_upstream")]
    pub severity: Severity,
    /// Originating camera id.
    #[serde(default)]
    pub camera_id: Option<EntityId>,
    /// Originating camera name.
    #[serde(default, alias = "camera_name")]
    pub camera_name: Option<String>,
    /// When the event happened.
    #[serde(default, alias = "ts", deserialize_with = "timestamp::deserialize_opt")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Detector confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Zones the event touched.
    #[serde(default)]
    pub zones: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Producer metadata (may carry `detectionTypes`).
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Raw payload attached by the collaborator.
    #[serde(default, alias = "payload_json")]
    pub payload: Option<serde_json::Value>,
}

impl Event {
    /// Creates an event with the given id and severity and no other data.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, severity: Severity) -> Self {
        Self {
            id: Some(id.into()),
            event_type: None,
            detection_type: None,
            severity,
            camera_id: None,
            camera_name: None,
            timestamp: None,
            confidence: None,
            zones: Vec::new(),
            tags: Vec::new(),
            metadata: None,
            payload: None,
        }
    }

    /// Detection types listed under `metadata.detectionTypes`.
    ///
    /// Malformed metadata contributes nothing.
    #[must_use]
    pub fn metadata_detection_types(&self) -> Vec<String> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("detectionTypes"))
            .and_then(serde_json::Value::as_array)
            .map(|types| {
                types
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Type label used for analyses: detection type, then event type, then
    /// `"event"`.
    #[must_use]
    pub fn analysis_type(&self) -> &str {
        self.detection_type
            .as_deref()
            .or(self.event_type.as_deref())
            .unwrap_or("event")
    }
}

/// A raw detection as delivered on `security/detections/new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Detection id.
    #[serde(default)]
    pub id: Option<EntityId>,
    /// Camera that produced the detection.
    pub camera_id: EntityId,
    /// When the detection happened.
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Every other field, kept verbatim.
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}
