//! Broker wire frames.
//!
//! Every frame is a JSON object discriminated by `type`. The console sends
//! `subscribe` and `publish` frames and receives `message` frames; other
//! inbound types are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Frame sent from the console to the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Subscribes the connection to a set of topics.
    Subscribe {
        /// Topic names.
        topics: Vec<String>,
    },
    /// Publishes one message.
    Publish {
        /// Client-generated message id.
        id: String,
        /// Destination topic.
        topic: String,
        /// Message body.
        payload: serde_json::Value,
        /// When the console produced the message.
        timestamp: DateTime<Utc>,
    },
}

impl ClientFrame {
    /// Builds a subscribe frame for `topics`.
    #[must_use]
    pub const fn subscribe(topics: Vec<String>) -> Self {
        Self::Subscribe { topics }
    }

    /// Builds a publish frame with a fresh id, stamped now.
    #[must_use]
    pub fn publish(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Publish {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Frame received from the broker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A message delivered on a subscribed topic.
    Message {
        /// Topic the message was published on.
        topic: String,
        /// Message body.
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Acks, pings, and anything else the console does not act on.
    #[serde(other)]
    Other,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_frame_shape() {
        let frame = ClientFrame::subscribe(vec!["security/events/new".to_string()]);
        let Ok(value) = serde_json::to_value(&frame) else {
            panic!("frame must serialize");
        };
        assert_eq!(
            value,
            json!({"type": "subscribe", "topics": ["security/events/new"]})
        );
    }

    #[test]
    fn publish_frame_carries_id_and_timestamp() {
        let frame = ClientFrame::publish("camera/cam-1/frame", json!({"frame": "AAAA"}));
        let Ok(value) = serde_json::to_value(&frame) else {
            panic!("frame must serialize");
        };
        assert_eq!(value.get("type"), Some(&json!("publish")));
        assert_eq!(value.get("topic"), Some(&json!("camera/cam-1/frame")));
        assert!(value.get("id").and_then(|v| v.as_str()).is_some_and(|id| !id.is_empty()));
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn message_frame_decodes() {
        let raw = r#"{"type":"message","topic":"system:status","payload":{"status":"ok"}}"#;
        let Ok(frame) = serde_json::from_str::<ServerFrame>(raw) else {
            panic!("message frame must decode");
        };
        assert_eq!(
            frame,
            ServerFrame::Message {
                topic: "system:status".to_string(),
                payload: json!({"status": "ok"}),
            }
        );
    }

    #[test]
    fn unknown_frame_types_are_other() {
        let Ok(frame) = serde_json::from_str::<ServerFrame>(r#"{"type":"suback","ok":true}"#)
        else {
            panic!("unknown frame must decode");
        };
        assert_eq!(frame, ServerFrame::Other);
    }
}
