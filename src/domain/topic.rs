//! Broker topic names and their logical event names.

use std::fmt;

/// Topics the console subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundTopic {
    /// `security/events/new`
    EventsNew,
    /// `security/events/update`
    EventsUpdate,
    /// `security/incidents/new`
    IncidentsNew,
    /// `security/incidents/update`
    IncidentsUpdate,
    /// `security/cameras/status`
    CameraStatus,
    /// `security/cameras/frames`
    CameraFrames,
    /// `security/cameras/overlays`
    CameraOverlays,
    /// `security/detections/new`
    DetectionsNew,
    /// `rules:change`
    RulesChange,
    /// `models:change`
    ModelsChange,
    /// `system:status`
    SystemStatus,
    /// `alert:notification`
    AlertNotification,
}

impl InboundTopic {
    /// Every inbound topic, in subscription order.
    pub const ALL: [Self; 12] = [
        Self::EventsNew,
        Self::EventsUpdate,
        Self::IncidentsNew,
        Self::IncidentsUpdate,
        Self::CameraStatus,
        Self::CameraFrames,
        Self::CameraOverlays,
        Self::DetectionsNew,
        Self::RulesChange,
        Self::ModelsChange,
        Self::SystemStatus,
        Self::AlertNotification,
    ];

    /// Topic string on the broker.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EventsNew => "security/events/new",
            Self::EventsUpdate => "security/events/update",
            Self::IncidentsNew => "security/incidents/new",
            Self::IncidentsUpdate => "security/incidents/update",
            Self::CameraStatus => "security/cameras/status",
            Self::CameraFrames => "security/cameras/frames",
            Self::CameraOverlays => "security/cameras/overlays",
            Self::DetectionsNew => "security/detections/new",
            Self::RulesChange => "rules:change",
            Self::ModelsChange => "models:change",
            Self::SystemStatus => "system:status",
            Self::AlertNotification => "alert:notification",
        }
    }

    /// Logical event name the topic is delivered as.
    #[must_use]
    pub const fn logical_name(&self) -> &'static str {
        match self {
            Self::EventsNew => "event:new",
            Self::EventsUpdate => "event:update",
            Self::IncidentsNew => "incident:new",
            Self::IncidentsUpdate => "incident:update",
            Self::CameraStatus => "camera:status",
            Self::CameraFrames => "camera:frame",
            Self::CameraOverlays => "camera:overlays",
            Self::DetectionsNew => "detection:new",
            Self::RulesChange => "rules:change",
            Self::ModelsChange => "models:change",
            Self::SystemStatus => "system:status",
            Self::AlertNotification => "alert:notification",
        }
    }

    /// Looks up a topic by its broker string.
    #[must_use]
    pub fn parse(topic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == topic)
    }

    /// Every topic string, for the subscribe frame.
    #[must_use]
    pub fn all_topics() -> Vec<String> {
        Self::ALL.iter().map(|t| t.as_str().to_string()).collect()
    }
}

impl fmt::Display for InboundTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound topic for frames captured under `camera_id`.
#[must_use]
pub fn frame_topic(camera_id: &str) -> String {
    format!("camera/{camera_id}/frame")
}
