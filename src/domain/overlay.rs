//! Per-frame object overlays and the camera frames they annotate.
//!
//! Overlays are ephemeral: each [`OverlayFrame`] carries the complete set of
//! detections for the latest frame of one camera and replaces the previous
//! set wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::timestamp;

/// Axis-aligned bounding box in frame pixel coordinates.
///
/// Serialized as the `[x1, y1, x2, y2]` array producers send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl BoundingBox {
    /// Creates a box from its corner coordinates.
    #[must_use]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width, never negative.
    #[must_use]
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Height, never negative.
    #[must_use]
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One detected object on a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    /// Detector label (e.g. `front door`, `latch`, `person`).
    #[serde(default)]
    pub label: String,
    /// Object location; producers omitting it get an empty box.
    #[serde(default)]
    pub bbox: BoundingBox,
    /// Detector confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// State reading (e.g. `open`, `closed`, `locked`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Activity reading (e.g. `walking`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    /// Free-text explanation from the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Overlay {
    /// Creates an overlay with a label and box and no readings.
    #[must_use]
    pub fn new(label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence: None,
            status: None,
            activity: None,
            explanation: None,
        }
    }

    /// Returns the overlay with the given status reading.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Returns the overlay with the given activity reading.
    #[must_use]
    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    /// Returns the overlay with the given confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Payload of `security/cameras/overlays`: the full overlay set of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrame {
    /// Camera the frame belongs to.
    pub camera_id: EntityId,
    /// Every detection on the frame; empty means nothing was detected.
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    /// Frame capture time.
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Payload of `security/cameras/frames`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraFrame {
    /// Camera the frame belongs to.
    pub camera_id: EntityId,
    /// Base64-encoded image.
    pub frame: String,
    /// Frame capture time.
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bbox_decodes_from_array() {
        let raw = json!({"label": "door", "bbox": [10.0, 20.0, 110.0, 220.0], "status": "open"});
        let Ok(overlay) = serde_json::from_value::<Overlay>(raw) else {
            panic!("overlay must decode");
        };
        assert_eq!(overlay.bbox, BoundingBox::new(10.0, 20.0, 110.0, 220.0));
        assert_eq!(overlay.status.as_deref(), Some("open"));
    }

    #[test]
    fn inverted_box_has_zero_extent() {
        let bbox = BoundingBox::new(50.0, 50.0, 10.0, 10.0);
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.height(), 0.0);
    }

    #[test]
    fn missing_bbox_defaults_to_origin() {
        let Ok(overlay) = serde_json::from_value::<Overlay>(json!({"label": "person"})) else {
            panic!("overlay must decode");
        };
        assert_eq!(overlay.bbox, BoundingBox::default());
    }

    #[test]
    fn serializes_bbox_as_array() {
        let overlay = Overlay::new("latch", BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        let value = serde_json::to_value(&overlay).unwrap_or_default();
        assert_eq!(value.get("bbox"), Some(&json!([1.0, 2.0, 3.0, 4.0])));
        assert!(value.get("status").is_none());
    }
}
