//! Communication log entries and model analyses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Severity;

/// Where a log entry originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    /// Broker traffic.
    Broker,
    /// HTTP collaborator traffic.
    Api,
}

impl LogSource {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Broker => "broker",
            Self::Api => "api",
        }
    }
}

/// One entry of the communication log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was recorded.
    pub ts: DateTime<Utc>,
    /// Origin of the traffic.
    pub source: LogSource,
    /// Broker topic, for broker entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Human-readable message or serialized payload.
    pub message: String,
}

impl LogEntry {
    /// Creates a broker log entry stamped now.
    #[must_use]
    pub fn broker(topic: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            source: LogSource::Broker,
            topic: topic.map(str::to_string),
            message: message.into(),
        }
    }

    /// Creates an API log entry stamped now.
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            source: LogSource::Api,
            topic: None,
            message: message.into(),
        }
    }
}

/// Model insight synthesized from an incoming event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// When the analysis was recorded.
    pub ts: DateTime<Utc>,
    /// Camera id, or `"unknown"`.
    pub camera_id: String,
    /// Detection or event type.
    #[serde(rename = "type")]
    pub analysis_type: String,
    /// Normalized severity.
    pub severity: Severity,
    /// Detector confidence, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Zones, detection types, camera tag and explicit tags, in that order.
    #[serde(default)]
    pub tags: Vec<String>,
}
