//! Camera model and status updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::timestamp;

/// Connectivity status of a camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    /// Camera is streaming.
    Online,
    /// Camera is unreachable or disabled.
    Offline,
    /// Camera reported a fault.
    Error,
    /// No status has been observed yet.
    #[default]
    #[serde(other)]
    Unknown,
}

impl CameraStatus {
    /// Status implied by the collaborator's enablement flag.
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Online } else { Self::Offline }
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// A camera known to the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    /// Unique camera id.
    pub id: EntityId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Last known status.
    #[serde(default)]
    pub status: CameraStatus,
    /// Resolution string as reported upstream (e.g. `1920x1080`).
    #[serde(default)]
    pub resolution: Option<String>,
    /// Enablement flag from the collaborator, when known.
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl Camera {
    /// Creates a camera with unknown status.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: CameraStatus::Unknown,
            resolution: None,
            enabled: None,
        }
    }

    /// Returns the camera with the given status.
    #[must_use]
    pub fn with_status(mut self, status: CameraStatus) -> Self {
        self.status = status;
        self
    }
}

/// Payload of `security/cameras/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatusUpdate {
    /// Camera the status applies to.
    pub camera_id: EntityId,
    /// New status.
    pub status: CameraStatus,
    /// When the producer observed the status.
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Partial camera update applied by [`crate::store::StateStore::update_camera`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraPatch {
    /// New display name.
    pub name: Option<String>,
    /// New status.
    pub status: Option<CameraStatus>,
    /// New resolution.
    pub resolution: Option<String>,
    /// New enablement flag.
    pub enabled: Option<bool>,
}

impl CameraPatch {
    /// Applies every set field onto `camera`.
    pub fn apply_to(&self, camera: &mut Camera) {
        if let Some(name) = &self.name {
            camera.name.clone_from(name);
        }
        if let Some(status) = self.status {
            camera.status = status;
        }
        if let Some(resolution) = &self.resolution {
            camera.resolution = Some(resolution.clone());
        }
        if let Some(enabled) = self.enabled {
            camera.enabled = Some(enabled);
        }
    }
}
