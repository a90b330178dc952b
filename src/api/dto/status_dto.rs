//! Response and request bodies of the status and capture endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::broker::ConnectionState;
use crate::domain::{EntityId, Overlay};
use crate::stability::CameraStability;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests.
    pub status: String,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Broker connection state.
    pub broker: ConnectionState,
}

/// Body of `GET /api/v1/cameras/{id}/overlays`.
#[derive(Debug, Clone, Serialize)]
pub struct CameraOverlaysResponse {
    /// Camera the overlays belong to.
    pub camera_id: EntityId,
    /// Latest overlay set, empty if none was received.
    pub overlays: Vec<Overlay>,
    /// Capture time of the overlay frame.
    pub timestamp: Option<DateTime<Utc>>,
    /// Smoothed door/latch/activity readings.
    pub stability: CameraStability,
    /// Badge lines as drawn on the frame.
    pub badges: Vec<String>,
}

/// Body of `PUT /api/v1/capture/publishing`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PublishingRequest {
    /// Whether sampled frames are published.
    pub enabled: bool,
}
