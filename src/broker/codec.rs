//! Decoding of inbound `(topic, payload)` pairs into [`BrokerEvent`]s.

use serde::de::DeserializeOwned;

use crate::domain::{
    BrokerEvent, CameraFrame, CameraStatusUpdate, Detection, Event, InboundTopic, Incident,
    Notification, NotificationKind, OverlayFrame,
};
use crate::error::ConsoleError;

/// Decodes one inbound message.
///
/// Returns `Ok(None)` for topics the console does not consume.
///
/// # Errors
///
/// Returns [`ConsoleError::Decode`] if the payload does not match the
/// topic's schema, or if an update carries no id to match against.
pub fn decode(topic: &str, payload: serde_json::Value) -> Result<Option<BrokerEvent>, ConsoleError> {
    let Some(inbound) = InboundTopic::parse(topic) else {
        return Ok(None);
    };

    let event = match inbound {
        InboundTopic::EventsNew => BrokerEvent::EventNew(parse::<Event>(topic, payload)?),
        InboundTopic::EventsUpdate => {
            let event = parse::<Event>(topic, payload)?;
            if event.id.is_none() {
                return Err(missing_id(topic));
            }
            BrokerEvent::EventUpdate(event)
        }
        InboundTopic::IncidentsNew => {
            BrokerEvent::IncidentNew(parse::<Incident>(topic, payload)?)
        }
        InboundTopic::IncidentsUpdate => {
            let incident = parse::<Incident>(topic, payload)?;
            if incident.id.is_none() {
                return Err(missing_id(topic));
            }
            BrokerEvent::IncidentUpdate(incident)
        }
        InboundTopic::CameraStatus => {
            BrokerEvent::CameraStatus(parse::<CameraStatusUpdate>(topic, payload)?)
        }
        InboundTopic::CameraFrames => {
            BrokerEvent::CameraFrame(parse::<CameraFrame>(topic, payload)?)
        }
        InboundTopic::CameraOverlays => {
            BrokerEvent::Overlays(parse::<OverlayFrame>(topic, payload)?)
        }
        InboundTopic::DetectionsNew => {
            BrokerEvent::DetectionNew(parse::<Detection>(topic, payload)?)
        }
        InboundTopic::RulesChange => notification(NotificationKind::RulesChange, payload),
        InboundTopic::ModelsChange => notification(NotificationKind::ModelsChange, payload),
        InboundTopic::SystemStatus => notification(NotificationKind::SystemStatus, payload),
        InboundTopic::AlertNotification => {
            notification(NotificationKind::AlertNotification, payload)
        }
    };
    Ok(Some(event))
}

fn parse<T: DeserializeOwned>(topic: &str, payload: serde_json::Value) -> Result<T, ConsoleError> {
    serde_json::from_value(payload).map_err(|e| ConsoleError::Decode {
        topic: topic.to_string(),
        reason: e.to_string(),
    })
}

fn missing_id(topic: &str) -> ConsoleError {
    ConsoleError::Decode {
        topic: topic.to_string(),
        reason: "update without id".to_string(),
    }
}

fn notification(kind: NotificationKind, payload: serde_json::Value) -> BrokerEvent {
    BrokerEvent::Notification(Notification { kind, payload })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CameraStatus, Severity};
    use serde_json::json;

    #[test]
    fn decodes_new_event() {
        let payload = json!({"id": 5, "severity": "critical", "cameraId": "cam-1"});
        let Ok(Some(BrokerEvent::EventNew(event))) = decode("security/events/new", payload) else {
            panic!("expected event:new");
        };
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.camera_id.as_ref().map(|c| c.as_str()), Some("cam-1"));
    }

    #[test]
    fn update_without_id_is_rejected() {
        let result = decode("security/events/update", json!({"severity": "warn"}));
        assert!(matches!(result, Err(ConsoleError::Decode { .. })));
        let result = decode("security/incidents/update", json!({"status": "closed"}));
        assert!(matches!(result, Err(ConsoleError::Decode { .. })));
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let result = decode("security/cameras/status", json!({"status": "online"}));
        let Err(ConsoleError::Decode { topic, .. }) = result else {
            panic!("missing cameraId must fail");
        };
        assert_eq!(topic, "security/cameras/status");
    }

    #[test]
    fn decodes_camera_status() {
        let payload = json!({"cameraId": 7, "status": "online", "timestamp": 1_700_000_000_000_i64});
        let Ok(Some(BrokerEvent::CameraStatus(update))) =
            decode("security/cameras/status", payload)
        else {
            panic!("expected camera:status");
        };
        assert_eq!(update.camera_id.as_str(), "7");
        assert_eq!(update.status, CameraStatus::Online);
    }

    #[test]
    fn passthrough_topics_keep_payload() {
        let payload = json!({"title": "Door", "message": "opened", "severity": "high"});
        let Ok(Some(BrokerEvent::Notification(n))) =
            decode("alert:notification", payload.clone())
        else {
            panic!("expected notification");
        };
        assert_eq!(n.kind, NotificationKind::AlertNotification);
        assert_eq!(n.payload, payload);
    }

    #[test]
    fn unknown_topics_are_ignored() {
        let Ok(None) = decode("camera/cam-1/frame", json!({})) else {
            panic!("outbound topic must not decode");
        };
    }
}
