//! Domain layer: entities, typed broker events, and the event bus.
//!
//! This module contains the console's data model (cameras, events,
//! incidents, detections, overlays, log entries, analyses), the
//! [`BrokerEvent`] tagged union every inbound message is decoded into, and
//! the [`EventBus`] that carries decoded events to the store and observers.

pub mod activity;
pub mod broker_event;
pub mod camera;
pub mod entity_id;
pub mod event;
pub mod event_bus;
pub mod incident;
pub mod overlay;
pub mod timestamp;
pub mod topic;

pub use activity::{Analysis, LogEntry, LogSource};
pub use broker_event::{BrokerEvent, Notification, NotificationKind};
pub use camera::{Camera, CameraPatch, CameraStatus, CameraStatusUpdate};
pub use entity_id::EntityId;
pub use event::{Detection, Event, Severity};
pub use event_bus::{EventBus, StoreFeed};
pub use incident::Incident;
pub use overlay::{BoundingBox, CameraFrame, Overlay, OverlayFrame};
pub use topic::{InboundTopic, frame_topic};
