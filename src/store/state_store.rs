//! The console's authoritative in-memory model.
//!
//! [`StateStore`] owns every collection the console displays: cameras,
//! events, detections, incidents, the latest frame and overlay set per
//! camera, the communication log, synthesized analyses, and the
//! [`StabilityTracker`]. Mutators are synchronous; the store is shared as
//! `Arc<tokio::sync::RwLock<StateStore>>` and written by the dispatcher and
//! the HTTP sync tasks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::retention::{RetainedFeed, Upsert};
use crate::domain::{
    Analysis, BrokerEvent, Camera, CameraFrame, CameraPatch, CameraStatus, CameraStatusUpdate,
    Detection, EntityId, Event, Incident, LogEntry, NotificationKind, Overlay,
    OverlayFrame, Severity,
};
use crate::stability::{CameraStability, StabilityTracker};

/// Maximum number of retained events.
pub const EVENT_CAPACITY: usize = 1000;
/// Maximum number of retained detections.
pub const DETECTION_CAPACITY: usize = 500;
/// Maximum number of retained incidents.
pub const INCIDENT_CAPACITY: usize = 100;
/// Maximum number of retained log entries.
pub const LOG_CAPACITY: usize = 200;
/// Maximum number of retained analyses.
pub const ANALYSIS_CAPACITY: usize = 200;

/// Aggregate camera and alert counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    /// Number of known cameras.
    pub cameras: usize,
    /// Cameras whose status is online.
    pub online: usize,
    /// Cameras whose status is offline.
    pub offline: usize,
    /// High-severity events currently retained.
    pub alerts: usize,
    /// Backend health string, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Point-in-time overview of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    /// Camera and alert counts.
    #[serde(flatten)]
    pub system: SystemStatus,
    /// Whether the broker connection is up.
    pub broker_connected: bool,
    /// Time of the last mutation.
    pub last_update: Option<DateTime<Utc>>,
    /// Retained events.
    pub events: usize,
    /// Retained incidents.
    pub incidents: usize,
    /// Retained detections.
    pub detections: usize,
    /// Retained analyses.
    pub analyses: usize,
}

/// Everything the render step draws on top of one camera's frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    /// Latest overlay set for the camera.
    pub overlays: Vec<Overlay>,
    /// Smoothed door/latch/activity readings.
    pub stability: CameraStability,
}

/// Single authoritative model of cameras, events, and derived state.
#[derive(Debug)]
pub struct StateStore {
    cameras: Vec<Camera>,
    events: RetainedFeed<Event>,
    detections: RetainedFeed<Detection>,
    incidents: RetainedFeed<Incident>,
    logs: RetainedFeed<LogEntry>,
    analyses: RetainedFeed<Analysis>,
    frames: HashMap<EntityId, CameraFrame>,
    overlays: HashMap<EntityId, OverlayFrame>,
    stability: StabilityTracker,
    system: SystemStatus,
    broker_connected: bool,
    last_update: Option<DateTime<Utc>>,
}

impl StateStore {
    /// Creates an empty store with the default retention bounds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cameras: Vec::new(),
            events: RetainedFeed::new(EVENT_CAPACITY),
            detections: RetainedFeed::new(DETECTION_CAPACITY),
            incidents: RetainedFeed::new(INCIDENT_CAPACITY),
            logs: RetainedFeed::new(LOG_CAPACITY),
            analyses: RetainedFeed::new(ANALYSIS_CAPACITY),
            frames: HashMap::new(),
            overlays: HashMap::new(),
            stability: StabilityTracker::new(),
            system: SystemStatus::default(),
            broker_connected: false,
            last_update: None,
        }
    }

    fn touch(&mut self) {
        self.last_update = Some(Utc::now());
    }

    // -- bulk replacement ---------------------------------------------------

    /// Replaces the camera list and recomputes online/offline counts.
    pub fn set_cameras(&mut self, cameras: Vec<Camera>) {
        self.cameras = cameras;
        self.recount_cameras();
        self.touch();
    }

    /// Replaces the event feed with `events`, newest first.
    pub fn set_events(&mut self, events: Vec<Event>) {
        self.events.replace_all(events);
        self.touch();
    }

    /// Replaces the incident feed with `incidents`, newest first.
    pub fn set_incidents(&mut self, incidents: Vec<Incident>) {
        self.incidents.replace_all(incidents);
        self.touch();
    }

    // -- upserts ------------------------------------------------------------

    /// Inserts or replaces an event by id.
    pub fn add_event(&mut self, event: Event) -> Upsert {
        let outcome = self.events.upsert(event);
        self.touch();
        outcome
    }

    /// Applies an event update; same upsert semantics as [`Self::add_event`].
    pub fn update_event(&mut self, event: Event) -> Upsert {
        self.add_event(event)
    }

    /// Inserts or replaces a detection by id.
    pub fn add_detection(&mut self, detection: Detection) -> Upsert {
        let outcome = self.detections.upsert(detection);
        self.touch();
        outcome
    }

    /// Inserts or replaces an incident by id.
    pub fn add_incident(&mut self, incident: Incident) -> Upsert {
        let outcome = self.incidents.upsert(incident);
        self.touch();
        outcome
    }

    /// Applies an incident update; same upsert semantics as
    /// [`Self::add_incident`].
    pub fn update_incident(&mut self, incident: Incident) -> Upsert {
        self.add_incident(incident)
    }

    // -- cameras ------------------------------------------------------------

    /// Sets one camera's status and recomputes the online/offline counts
    /// from the full list.
    ///
    /// Returns `false` if no camera has that id; the list is then unchanged.
    pub fn update_camera_status(&mut self, camera_id: &EntityId, status: CameraStatus) -> bool {
        let found = match self.cameras.iter_mut().find(|c| &c.id == camera_id) {
            Some(camera) => {
                camera.status = status;
                true
            }
            None => false,
        };
        self.recount_cameras();
        self.touch();
        found
    }

    /// Applies a partial update to one camera.
    ///
    /// Returns `false` if no camera has that id.
    pub fn update_camera(&mut self, camera_id: &EntityId, patch: &CameraPatch) -> bool {
        let Some(camera) = self.cameras.iter_mut().find(|c| &c.id == camera_id) else {
            return false;
        };
        patch.apply_to(camera);
        if patch.status.is_some() {
            self.recount_cameras();
        }
        self.touch();
        true
    }

    fn recount_cameras(&mut self) {
        self.system.cameras = self.cameras.len();
        self.system.online = self.count_status(CameraStatus::Online);
        self.system.offline = self.count_status(CameraStatus::Offline);
    }

    fn count_status(&self, status: CameraStatus) -> usize {
        self.cameras.iter().filter(|c| c.status == status).count()
    }

    /// Stores the latest frame of a camera, replacing the previous one.
    pub fn set_camera_frame(&mut self, frame: CameraFrame) {
        self.frames.insert(frame.camera_id.clone(), frame);
        self.touch();
    }

    /// Replaces a camera's overlay set and feeds it to the stability
    /// tracker.
    pub fn set_overlays(&mut self, frame: OverlayFrame) {
        self.stability.observe(&frame.camera_id, &frame.overlays);
        self.overlays.insert(frame.camera_id.clone(), frame);
        self.touch();
    }

    // -- activity -----------------------------------------------------------

    /// Prepends a communication log entry.
    pub fn add_log(&mut self, entry: LogEntry) {
        self.logs.push_front(entry);
        self.touch();
    }

    /// Prepends an analysis.
    pub fn add_analysis(&mut self, analysis: Analysis) {
        self.analyses.push_front(analysis);
        self.touch();
    }

    /// Records the broker connection flag.
    pub fn set_broker_connected(&mut self, connected: bool) {
        self.broker_connected = connected;
        self.touch();
    }

    /// Recomputes every [`SystemStatus`] field from current state.
    ///
    /// `status` replaces the health string when given.
    pub fn refresh_system_status(&mut self, status: Option<String>) {
        self.recount_cameras();
        self.system.alerts = self
            .events
            .iter()
            .filter(|e| e.severity == Severity::High)
            .count();
        if status.is_some() {
            self.system.status = status;
        }
        self.touch();
    }

    // -- broker events ------------------------------------------------------

    /// Routes a decoded broker event to the matching mutators and records it
    /// in the communication log.
    pub fn apply(&mut self, event: BrokerEvent) {
        let topic = event.topic().map(|t| t.as_str());
        match event {
            BrokerEvent::Connected => {
                self.set_broker_connected(true);
                self.add_log(LogEntry::broker(None, "broker connected"));
            }
            BrokerEvent::Disconnected => {
                self.set_broker_connected(false);
                self.add_log(LogEntry::broker(None, "broker disconnected"));
            }
            BrokerEvent::EventNew(event) => {
                let message = to_log_message(&event);
                let analysis = synthesize_analysis(&event);
                if self.add_event(event) == Upsert::Inserted {
                    self.add_analysis(analysis);
                }
                self.add_log(LogEntry::broker(topic, message));
            }
            BrokerEvent::EventUpdate(event) => {
                let message = to_log_message(&event);
                self.update_event(event);
                self.add_log(LogEntry::broker(topic, message));
            }
            BrokerEvent::IncidentNew(incident) => {
                let message = to_log_message(&incident);
                self.add_incident(incident);
                self.add_log(LogEntry::broker(topic, message));
            }
            BrokerEvent::IncidentUpdate(incident) => {
                let message = to_log_message(&incident);
                self.update_incident(incident);
                self.add_log(LogEntry::broker(topic, message));
            }
            BrokerEvent::CameraStatus(update) => self.apply_camera_status(topic, &update),
            BrokerEvent::CameraFrame(frame) => {
                let message = frame.camera_id.to_string();
                self.set_camera_frame(frame);
                self.add_log(LogEntry::broker(topic, message));
            }
            BrokerEvent::Overlays(frame) => {
                let message = frame.camera_id.to_string();
                self.set_overlays(frame);
                self.add_log(LogEntry::broker(topic, message));
            }
            BrokerEvent::DetectionNew(detection) => {
                let message = detection.camera_id.to_string();
                self.add_detection(detection);
                self.add_log(LogEntry::broker(topic, message));
            }
            BrokerEvent::Notification(notification) => {
                if notification.kind == NotificationKind::SystemStatus
                    && let Some(status) = notification
                        .payload
                        .get("status")
                        .and_then(serde_json::Value::as_str)
                {
                    self.system.status = Some(status.to_string());
                    self.touch();
                }
                self.add_log(LogEntry::broker(topic, to_log_message(&notification.payload)));
            }
        }
    }

    fn apply_camera_status(&mut self, topic: Option<&str>, update: &CameraStatusUpdate) {
        if !self.update_camera_status(&update.camera_id, update.status) {
            tracing::debug!(
                camera_id = %update.camera_id,
                "status update for unknown camera"
            );
        }
        self.add_log(LogEntry::broker(topic, to_log_message(update)));
    }

    // -- snapshots ----------------------------------------------------------

    /// Aggregate counts and connection state.
    #[must_use]
    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            system: self.system.clone(),
            broker_connected: self.broker_connected,
            last_update: self.last_update,
            events: self.events.len(),
            incidents: self.incidents.len(),
            detections: self.detections.len(),
            analyses: self.analyses.len(),
        }
    }

    /// Current [`SystemStatus`].
    #[must_use]
    pub const fn system_status(&self) -> &SystemStatus {
        &self.system
    }

    /// Whether the broker connection is up.
    #[must_use]
    pub const fn broker_connected(&self) -> bool {
        self.broker_connected
    }

    /// Time of the last mutation.
    #[must_use]
    pub const fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Known cameras.
    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Looks up one camera.
    #[must_use]
    pub fn camera(&self, camera_id: &EntityId) -> Option<&Camera> {
        self.cameras.iter().find(|c| &c.id == camera_id)
    }

    /// Retained events, newest first.
    #[must_use]
    pub const fn events(&self) -> &RetainedFeed<Event> {
        &self.events
    }

    /// Retained incidents, newest first.
    #[must_use]
    pub const fn incidents(&self) -> &RetainedFeed<Incident> {
        &self.incidents
    }

    /// Retained detections, newest first.
    #[must_use]
    pub const fn detections(&self) -> &RetainedFeed<Detection> {
        &self.detections
    }

    /// Communication log, newest first.
    #[must_use]
    pub const fn logs(&self) -> &RetainedFeed<LogEntry> {
        &self.logs
    }

    /// Synthesized analyses, newest first.
    #[must_use]
    pub const fn analyses(&self) -> &RetainedFeed<Analysis> {
        &self.analyses
    }

    /// Latest frame of a camera.
    #[must_use]
    pub fn frame(&self, camera_id: &EntityId) -> Option<&CameraFrame> {
        self.frames.get(camera_id)
    }

    /// Latest overlay set of a camera.
    #[must_use]
    pub fn overlays(&self, camera_id: &EntityId) -> Option<&OverlayFrame> {
        self.overlays.get(camera_id)
    }

    /// Smoothed readings of a camera.
    #[must_use]
    pub fn overlay_stats(&self, camera_id: &EntityId) -> Option<&CameraStability> {
        self.stability.get(camera_id)
    }

    /// Overlays and smoothed readings to draw for a camera.
    ///
    /// Cameras never seen yield empty overlays and placeholder readings.
    #[must_use]
    pub fn annotations(&self, camera_id: &EntityId) -> Annotations {
        Annotations {
            overlays: self
                .overlays(camera_id)
                .map(|f| f.overlays.clone())
                .unwrap_or_default(),
            stability: self.overlay_stats(camera_id).cloned().unwrap_or_default(),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the analysis recorded for a newly inserted event.
#[must_use]
pub fn synthesize_analysis(event: &Event) -> Analysis {
    let mut tags = event.zones.clone();
    tags.extend(event.metadata_detection_types());
    if let Some(camera_id) = &event.camera_id {
        tags.push(format!("camera:{camera_id}"));
    }
    tags.extend(event.tags.iter().cloned());

    Analysis {
        ts: Utc::now(),
        camera_id: event
            .camera_id
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string),
        analysis_type: event.analysis_type().to_string(),
        severity: event.severity,
        confidence: event.confidence,
        tags,
    }
}

fn to_log_message<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{BoundingBox, Notification};
    use crate::stability::OverlayAttribute;
    use serde_json::json;

    fn event(id: u64, severity: Severity) -> Event {
        Event::new(id, severity)
    }

    fn event_ids(store: &StateStore) -> Vec<String> {
        store
            .events()
            .iter()
            .filter_map(|e| e.id.as_ref().map(ToString::to_string))
            .collect()
    }

    fn cameras() -> Vec<Camera> {
        vec![
            Camera::new("cam-1", "Front").with_status(CameraStatus::Online),
            Camera::new("cam-2", "Back").with_status(CameraStatus::Offline),
            Camera::new("cam-3", "Garage").with_status(CameraStatus::Online),
        ]
    }

    #[test]
    fn event_feed_is_bounded_and_newest_first() {
        let mut store = StateStore::new();
        for n in 0..1200_u64 {
            store.apply(BrokerEvent::EventNew(event(n, Severity::Low)));
        }
        assert_eq!(store.events().len(), EVENT_CAPACITY);
        let Some(newest) = store.events().get(0) else {
            panic!("feed must not be empty");
        };
        assert_eq!(newest.id, Some(EntityId::from(1199_u64)));
        assert_eq!(store.analyses().len(), ANALYSIS_CAPACITY);
        assert_eq!(store.logs().len(), LOG_CAPACITY);
    }

    #[test]
    fn update_replaces_severity_in_place() {
        let mut store = StateStore::new();
        store.apply(BrokerEvent::EventNew(event(4, Severity::Low)));
        let Ok(critical) =
            serde_json::from_value::<Event>(json!({"id": 5, "severity": "critical"}))
        else {
            panic!("event must decode");
        };
        store.apply(BrokerEvent::EventNew(critical));
        store.apply(BrokerEvent::EventNew(event(6, Severity::Low)));

        let Ok(warn) = serde_json::from_value::<Event>(json!({"id": "5", "severity": "warn"}))
        else {
            panic!("event must decode");
        };
        store.apply(BrokerEvent::EventUpdate(warn));

        assert_eq!(event_ids(&store), vec!["6", "5", "4"]);
        assert_eq!(store.events().get(1).map(|e| e.severity), Some(Severity::Medium));
    }

    #[test]
    fn update_before_new_is_inserted() {
        let mut store = StateStore::new();
        assert_eq!(store.update_event(event(9, Severity::High)), Upsert::Inserted);
        assert_eq!(store.add_event(event(9, Severity::Low)), Upsert::Replaced(0));
        assert_eq!(store.events().len(), 1);
    }

    #[test]
    fn redelivered_event_synthesizes_one_analysis() {
        let mut store = StateStore::new();
        store.apply(BrokerEvent::EventNew(event(1, Severity::High)));
        store.apply(BrokerEvent::EventNew(event(1, Severity::High)));
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.analyses().len(), 1);
    }

    #[test]
    fn analysis_tags_follow_source_order() {
        let Ok(event) = serde_json::from_value::<Event>(json!({
            "id": 1,
            "detectionType": "person",
            "severity": "critical",
            "cameraId": "cam-1",
            "confidence": 0.91,
            "zones": ["porch"],
            "tags": ["night"],
            "metadata": {"detectionTypes": ["person", "vehicle"]},
        })) else {
            panic!("event must decode");
        };
        let analysis = synthesize_analysis(&event);
        assert_eq!(
            analysis.tags,
            vec!["porch", "person", "vehicle", "camera:cam-1", "night"]
        );
        assert_eq!(analysis.analysis_type, "person");
        assert_eq!(analysis.severity, Severity::High);
        assert_eq!(analysis.camera_id, "cam-1");
        assert_eq!(analysis.confidence, Some(0.91));
    }

    #[test]
    fn analysis_defaults_without_sources() {
        let analysis = synthesize_analysis(&event(1, Severity::Low));
        assert!(analysis.tags.is_empty());
        assert_eq!(analysis.camera_id, "unknown");
        assert_eq!(analysis.analysis_type, "event");
    }

    #[test]
    fn camera_status_recomputes_counts() {
        let mut store = StateStore::new();
        store.set_cameras(cameras());
        assert_eq!(store.system_status().online, 2);
        assert_eq!(store.system_status().offline, 1);

        store.apply(BrokerEvent::CameraStatus(CameraStatusUpdate {
            camera_id: EntityId::new("cam-1"),
            status: CameraStatus::Offline,
            timestamp: None,
        }));

        let status = store.system_status();
        let online = store
            .cameras()
            .iter()
            .filter(|c| c.status == CameraStatus::Online)
            .count();
        let offline = store
            .cameras()
            .iter()
            .filter(|c| c.status == CameraStatus::Offline)
            .count();
        assert_eq!((status.online, status.offline), (online, offline));
        assert_eq!((status.online, status.offline), (1, 2));
    }

    #[test]
    fn unknown_camera_status_leaves_list_unchanged() {
        let mut store = StateStore::new();
        store.set_cameras(cameras());
        let before = store.cameras().to_vec();
        assert!(!store.update_camera_status(&EntityId::new("cam-9"), CameraStatus::Error));
        assert_eq!(store.cameras(), before.as_slice());
    }

    #[test]
    fn update_camera_applies_patch() {
        let mut store = StateStore::new();
        store.set_cameras(cameras());
        let patch = CameraPatch {
            status: Some(CameraStatus::Online),
            ..CameraPatch::default()
        };
        assert!(store.update_camera(&EntityId::new("cam-2"), &patch));
        assert_eq!(store.system_status().online, 3);
        assert!(!store.update_camera(&EntityId::new("missing"), &patch));
    }

    #[test]
    fn incidents_upsert_and_stay_bounded() {
        let mut store = StateStore::new();
        for n in 0..150_u64 {
            store.apply(BrokerEvent::IncidentNew(Incident::new(n, "open")));
        }
        assert_eq!(store.incidents().len(), INCIDENT_CAPACITY);
        store.apply(BrokerEvent::IncidentUpdate(Incident::new(140_u64, "resolved")));
        assert_eq!(store.incidents().len(), INCIDENT_CAPACITY);
        let Some(updated) = store.incidents().get(9) else {
            panic!("incident must be retained");
        };
        assert_eq!(updated.status.as_deref(), Some("resolved"));
    }

    #[test]
    fn overlays_feed_stability_tracker() {
        let mut store = StateStore::new();
        let camera = EntityId::new("cam-1");
        for _ in 0..3 {
            store.apply(BrokerEvent::Overlays(OverlayFrame {
                camera_id: camera.clone(),
                overlays: vec![
                    Overlay::new("door", BoundingBox::new(0.0, 0.0, 5.0, 5.0)).with_status("open"),
                ],
                timestamp: None,
            }));
        }
        let annotations = store.annotations(&camera);
        assert_eq!(annotations.overlays.len(), 1);
        assert_eq!(annotations.stability.display(OverlayAttribute::Door), ("open", 3));

        let unseen = store.annotations(&EntityId::new("cam-2"));
        assert!(unseen.overlays.is_empty());
        assert_eq!(unseen.stability.display(OverlayAttribute::Latch), ("Unknown", 0));
    }

    #[test]
    fn frames_keep_latest_per_camera() {
        let mut store = StateStore::new();
        for frame in ["a", "b"] {
            store.apply(BrokerEvent::CameraFrame(CameraFrame {
                camera_id: EntityId::new("cam-1"),
                frame: frame.to_string(),
                timestamp: None,
            }));
        }
        assert_eq!(
            store.frame(&EntityId::new("cam-1")).map(|f| f.frame.as_str()),
            Some("b")
        );
        let Some(log) = store.logs().get(0) else {
            panic!("frame must be logged");
        };
        assert_eq!(log.message, "cam-1");
        assert_eq!(log.topic.as_deref(), Some("security/cameras/frames"));
    }

    #[test]
    fn connection_changes_set_flag_and_log() {
        let mut store = StateStore::new();
        store.apply(BrokerEvent::Connected);
        assert!(store.broker_connected());
        store.apply(BrokerEvent::Disconnected);
        assert!(!store.broker_connected());
        assert_eq!(store.logs().len(), 2);
    }

    #[test]
    fn system_status_notification_updates_health() {
        let mut store = StateStore::new();
        store.apply(BrokerEvent::Notification(Notification {
            kind: NotificationKind::SystemStatus,
            payload: json!({"status": "degraded"}),
        }));
        assert_eq!(store.system_status().status.as_deref(), Some("degraded"));
    }

    #[test]
    fn refresh_counts_high_severity_alerts() {
        let mut store = StateStore::new();
        store.set_cameras(cameras());
        store.set_events(vec![
            event(1, Severity::High),
            event(2, Severity::Medium),
            event(3, Severity::High),
        ]);
        store.refresh_system_status(Some("ok".to_string()));
        let status = store.system_status();
        assert_eq!(status.alerts, 2);
        assert_eq!(status.cameras, 3);
        assert_eq!(status.status.as_deref(), Some("ok"));
        assert!(store.last_update().is_some());
    }
}
