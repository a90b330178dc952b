//! Connection to the topic broker.
//!
//! - [`BrokerClient`]: connect/disconnect, non-blocking publish, typed
//!   subscription, and the reconnect supervisor.
//! - [`codec`]: `(topic, payload)` to [`crate::domain::BrokerEvent`].
//! - [`messages`]: JSON frames exchanged with the broker.
//! - [`transport`]: the [`Transport`]/[`Connection`] seam and its WebSocket
//!   implementation.

pub mod backoff;
pub mod client;
pub mod codec;
pub mod messages;
pub mod transport;

pub use backoff::Backoff;
pub use client::{BrokerClient, BrokerSettings, ConnectionState, PublishOutcome};
pub use messages::{ClientFrame, ServerFrame};
pub use transport::{Connection, Transport, WsConnection, WsTransport};
