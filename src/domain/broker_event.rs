//! Typed events decoded from broker traffic.
//!
//! Every inbound `(topic, payload)` pair is decoded at the broker boundary
//! into exactly one [`BrokerEvent`] variant before it reaches the
//! [`super::EventBus`]. Subscribers match on the variant exhaustively; there
//! is no string-keyed handler registry.

use serde::{Deserialize, Serialize};

use super::{
    CameraFrame, CameraStatusUpdate, Detection, Event, InboundTopic, Incident, OverlayFrame,
};

/// Kind of a passthrough notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Detection rules changed server-side.
    RulesChange,
    /// Custom models changed server-side.
    ModelsChange,
    /// Backend health/status broadcast.
    SystemStatus,
    /// User-facing alert.
    AlertNotification,
}

impl NotificationKind {
    /// Logical event name (`rules:change`, …).
    #[must_use]
    pub const fn logical_name(&self) -> &'static str {
        match self {
            Self::RulesChange => "rules:change",
            Self::ModelsChange => "models:change",
            Self::SystemStatus => "system:status",
            Self::AlertNotification => "alert:notification",
        }
    }
}

/// Passthrough notification with an implementation-defined payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Which notification this is.
    pub kind: NotificationKind,
    /// Payload as received.
    pub payload: serde_json::Value,
}

/// One decoded broker event or connection transition.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    /// The broker connection was established.
    Connected,
    /// The broker connection was lost or closed.
    Disconnected,
    /// `event:new`.
    EventNew(Event),
    /// `event:update`.
    EventUpdate(Event),
    /// `incident:new`.
    IncidentNew(Incident),
    /// `incident:update`.
    IncidentUpdate(Incident),
    /// `camera:status`.
    CameraStatus(CameraStatusUpdate),
    /// `camera:frame`.
    CameraFrame(CameraFrame),
    /// `camera:overlays`.
    Overlays(OverlayFrame),
    /// `detection:new`.
    DetectionNew(Detection),
    /// Passthrough notifications.
    Notification(Notification),
}

impl BrokerEvent {
    /// Returns the logical event name.
    #[must_use]
    pub const fn logical_name(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::EventNew(_) => "event:new",
            Self::EventUpdate(_) => "event:update",
            Self::IncidentNew(_) => "incident:new",
            Self::IncidentUpdate(_) => "incident:update",
            Self::CameraStatus(_) => "camera:status",
            Self::CameraFrame(_) => "camera:frame",
            Self::Overlays(_) => "camera:overlays",
            Self::DetectionNew(_) => "detection:new",
            Self::Notification(n) => n.kind.logical_name(),
        }
    }

    /// Topic the event was received on; `None` for connection transitions.
    #[must_use]
    pub const fn topic(&self) -> Option<InboundTopic> {
        Some(match self {
            Self::Connected | Self::Disconnected => return None,
            Self::EventNew(_) => InboundTopic::EventsNew,
            Self::EventUpdate(_) => InboundTopic::EventsUpdate,
            Self::IncidentNew(_) => InboundTopic::IncidentsNew,
            Self::IncidentUpdate(_) => InboundTopic::IncidentsUpdate,
            Self::CameraStatus(_) => InboundTopic::CameraStatus,
            Self::CameraFrame(_) => InboundTopic::CameraFrames,
            Self::Overlays(_) => InboundTopic::CameraOverlays,
            Self::DetectionNew(_) => InboundTopic::DetectionsNew,
            Self::Notification(n) => match n.kind {
                NotificationKind::RulesChange => InboundTopic::RulesChange,
                NotificationKind::ModelsChange => InboundTopic::ModelsChange,
                NotificationKind::SystemStatus => InboundTopic::SystemStatus,
                NotificationKind::AlertNotification => InboundTopic::AlertNotification,
            },
        })
    }

    /// Returns `true` for connection transitions.
    #[must_use]
    pub const fn is_connection_change(&self) -> bool {
        matches!(self, Self::Connected | Self::Disconnected)
    }
}
