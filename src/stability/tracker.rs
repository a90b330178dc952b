//! Consecutive-match smoothing of overlay readings.
//!
//! Per-frame detector output flickers. For every camera the tracker keeps,
//! per [`OverlayAttribute`], the value currently displayed and how many
//! successive observations agreed with it. The count saturates at
//! [`STABILITY_CAP`] and restarts at 1 whenever the value changes. Frames
//! without an observation for an attribute leave it untouched.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{EntityId, Overlay};

/// Saturation point of the stability counter.
pub const STABILITY_CAP: u8 = 30;

/// Attribute smoothed by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayAttribute {
    /// Door open/closed state, read from a `door` overlay's status.
    Door,
    /// Latch state, read from a `latch` overlay's status.
    Latch,
    /// Scene activity, read from an `activity` overlay's activity field.
    Activity,
}

impl OverlayAttribute {
    /// Every tracked attribute, in display order.
    pub const ALL: [Self; 3] = [Self::Door, Self::Latch, Self::Activity];

    /// Substring matched against lower-cased overlay labels.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Door => "door",
            Self::Latch => "latch",
            Self::Activity => "activity",
        }
    }

    /// Human-readable attribute name.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Door => "Door",
            Self::Latch => "Latch",
            Self::Activity => "Activity",
        }
    }

    /// Value displayed before anything has been observed.
    #[must_use]
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::Door | Self::Latch => "Unknown",
            Self::Activity => "None",
        }
    }

    /// Extracts this attribute's reading from a frame's overlay set.
    ///
    /// Uses the first overlay whose label mentions the keyword; returns
    /// `None` (no observation) if there is none or it carries no reading.
    #[must_use]
    pub fn extract<'a>(&self, overlays: &'a [Overlay]) -> Option<&'a str> {
        let overlay = overlays
            .iter()
            .find(|o| o.label.to_lowercase().contains(self.keyword()))?;
        let reading = match self {
            Self::Door | Self::Latch => overlay.status.as_deref(),
            Self::Activity => overlay.activity.as_deref(),
        };
        reading.filter(|v| !v.is_empty())
    }
}

/// Displayed value of one attribute and its consecutive-match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeReading {
    /// Value currently displayed.
    pub value: String,
    /// Consecutive observations agreeing with `value`, in `1..=30`.
    pub stability: u8,
}

impl AttributeReading {
    fn first(value: &str) -> Self {
        Self {
            value: value.to_string(),
            stability: 1,
        }
    }

    fn observe(&mut self, value: &str) {
        if self.value == value {
            self.stability = self.stability.saturating_add(1).min(STABILITY_CAP);
        } else {
            value.clone_into(&mut self.value);
            self.stability = 1;
        }
    }
}

/// Smoothed readings of one camera.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CameraStability {
    door: Option<AttributeReading>,
    latch: Option<AttributeReading>,
    activity: Option<AttributeReading>,
}

impl CameraStability {
    /// Reading for `attribute`, if it was ever observed.
    #[must_use]
    pub fn get(&self, attribute: OverlayAttribute) -> Option<&AttributeReading> {
        match attribute {
            OverlayAttribute::Door => self.door.as_ref(),
            OverlayAttribute::Latch => self.latch.as_ref(),
            OverlayAttribute::Activity => self.activity.as_ref(),
        }
    }

    /// Value and stability to display, falling back to the placeholder
    /// with stability 0.
    #[must_use]
    pub fn display(&self, attribute: OverlayAttribute) -> (&str, u8) {
        self.get(attribute).map_or((attribute.placeholder(), 0), |r| {
            (r.value.as_str(), r.stability)
        })
    }

    fn slot_mut(&mut self, attribute: OverlayAttribute) -> &mut Option<AttributeReading> {
        match attribute {
            OverlayAttribute::Door => &mut self.door,
            OverlayAttribute::Latch => &mut self.latch,
            OverlayAttribute::Activity => &mut self.activity,
        }
    }

    fn observe(&mut self, overlays: &[Overlay]) {
        for attribute in OverlayAttribute::ALL {
            let Some(value) = attribute.extract(overlays) else {
                continue;
            };
            let slot = self.slot_mut(attribute);
            if let Some(reading) = slot.as_mut() {
                reading.observe(value);
            } else {
                *slot = Some(AttributeReading::first(value));
            }
        }
    }
}

/// Per-camera stability state.
#[derive(Debug, Clone, Default)]
pub struct StabilityTracker {
    cameras: HashMap<EntityId, CameraStability>,
}

impl StabilityTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the overlay set of a new frame for `camera_id`.
    ///
    /// Returns the camera's updated readings.
    pub fn observe(&mut self, camera_id: &EntityId, overlays: &[Overlay]) -> &CameraStability {
        let stats = self.cameras.entry(camera_id.clone()).or_default();
        stats.observe(overlays);
        stats
    }

    /// Readings for `camera_id`, if any frame was observed for it.
    #[must_use]
    pub fn get(&self, camera_id: &EntityId) -> Option<&CameraStability> {
        self.cameras.get(camera_id)
    }

    /// Reading of one attribute of one camera.
    #[must_use]
    pub fn reading(
        &self,
        camera_id: &EntityId,
        attribute: OverlayAttribute,
    ) -> Option<&AttributeReading> {
        self.get(camera_id).and_then(|s| s.get(attribute))
    }

    /// Number of cameras with tracked state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Returns `true` if no camera has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;

    fn door(status: &str) -> Vec<Overlay> {
        vec![Overlay::new("Front Door", BoundingBox::new(0.0, 0.0, 10.0, 10.0)).with_status(status)]
    }

    fn door_stability(tracker: &StabilityTracker, camera: &EntityId) -> u8 {
        tracker
            .reading(camera, OverlayAttribute::Door)
            .map_or(0, |r| r.stability)
    }

    #[test]
    fn open_five_times_then_closed_twice() {
        let camera = EntityId::new("cam-1");
        let mut tracker = StabilityTracker::new();
        let mut sequence = Vec::new();

        for status in ["open", "open", "open", "open", "open", "closed", "closed"] {
            tracker.observe(&camera, &door(status));
            sequence.push(door_stability(&tracker, &camera));
        }

        assert_eq!(sequence, vec![1, 2, 3, 4, 5, 1, 2]);
        let Some(reading) = tracker.reading(&camera, OverlayAttribute::Door) else {
            panic!("door must be tracked");
        };
        assert_eq!(reading.value, "closed");
    }

    #[test]
    fn stability_saturates_at_cap() {
        let camera = EntityId::new("cam-1");
        let mut tracker = StabilityTracker::new();
        let mut previous = 0;

        for _ in 0..100 {
            tracker.observe(&camera, &door("open"));
            let current = door_stability(&tracker, &camera);
            assert!(current <= STABILITY_CAP);
            assert!(current > previous || current == STABILITY_CAP);
            previous = current;
        }
        assert_eq!(previous, STABILITY_CAP);
    }

    #[test]
    fn change_after_saturation_resets_to_one() {
        let camera = EntityId::new("cam-1");
        let mut tracker = StabilityTracker::new();
        for _ in 0..40 {
            tracker.observe(&camera, &door("open"));
        }
        tracker.observe(&camera, &door("closed"));
        assert_eq!(door_stability(&tracker, &camera), 1);
    }

    #[test]
    fn absent_observation_leaves_state_untouched() {
        let camera = EntityId::new("cam-1");
        let mut tracker = StabilityTracker::new();
        tracker.observe(&camera, &door("open"));
        tracker.observe(&camera, &door("open"));

        tracker.observe(&camera, &[]);
        tracker.observe(
            &camera,
            &[Overlay::new("person", BoundingBox::default()).with_activity("walking")],
        );
        // door overlay present but without a status reading
        tracker.observe(&camera, &[Overlay::new("door", BoundingBox::default())]);

        let Some(reading) = tracker.reading(&camera, OverlayAttribute::Door) else {
            panic!("door must be tracked");
        };
        assert_eq!(reading.value, "open");
        assert_eq!(reading.stability, 2);
    }

    #[test]
    fn attributes_are_tracked_independently() {
        let camera = EntityId::new("cam-1");
        let mut tracker = StabilityTracker::new();
        let frame = vec![
            Overlay::new("door", BoundingBox::default()).with_status("open"),
            Overlay::new("latch", BoundingBox::default()).with_status("locked"),
            Overlay::new("activity", BoundingBox::default()).with_activity("idle"),
        ];
        tracker.observe(&camera, &frame);
        tracker.observe(&camera, frame.get(1..).unwrap_or_default());

        assert_eq!(door_stability(&tracker, &camera), 1);
        let latch = tracker.reading(&camera, OverlayAttribute::Latch);
        assert_eq!(latch.map(|r| r.stability), Some(2));
        let activity = tracker.reading(&camera, OverlayAttribute::Activity);
        assert_eq!(activity.map(|r| r.value.as_str()), Some("idle"));
    }

    #[test]
    fn cameras_do_not_share_state() {
        let mut tracker = StabilityTracker::new();
        let a = EntityId::new("cam-a");
        let b = EntityId::new("cam-b");
        tracker.observe(&a, &door("open"));
        tracker.observe(&a, &door("open"));
        tracker.observe(&b, &door("open"));

        assert_eq!(door_stability(&tracker, &a), 2);
        assert_eq!(door_stability(&tracker, &b), 1);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn display_falls_back_to_placeholder() {
        let stats = CameraStability::default();
        assert_eq!(stats.display(OverlayAttribute::Door), ("Unknown", 0));
        assert_eq!(stats.display(OverlayAttribute::Activity), ("None", 0));
    }
}
