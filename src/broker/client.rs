//! Broker client with automatic reconnect.
//!
//! [`BrokerClient`] owns a single logical connection to the broker. A
//! background supervisor task opens the transport, sends the subscribe
//! frame, pumps inbound frames into the [`EventBus`] and outbound publishes
//! onto the wire, and reconnects with capped exponential backoff after an
//! unsolicited disconnect.
//!
//! # Connection notifications
//!
//! Each established session produces exactly one [`BrokerEvent::Connected`]
//! and, when it ends, exactly one [`BrokerEvent::Disconnected`]. Failed
//! attempts emit neither. The same transitions are observable through
//! [`BrokerClient::watch_state`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::backoff::Backoff;
use super::codec;
use super::messages::{ClientFrame, ServerFrame};
use super::transport::{Connection, Transport, WsTransport};
use crate::config::ConsoleConfig;
use crate::domain::{BrokerEvent, EventBus, InboundTopic};
use crate::error::ConsoleError;

/// Connection state of the broker client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session is open.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// A session is open and subscribed.
    Connected,
}

/// What happened to a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Queued for the current session.
    Queued,
    /// Dropped because the client is disconnected or the queue is full.
    Dropped,
}

/// Connection parameters of the broker client.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Broker URL.
    pub url: String,
    /// Upper bound on one connection attempt.
    pub connect_timeout: Duration,
    /// First reconnect delay.
    pub reconnect_base: Duration,
    /// Cap on the reconnect delay.
    pub reconnect_max: Duration,
    /// Capacity of the outbound publish queue.
    pub outbox_capacity: usize,
}

impl BrokerSettings {
    /// Extracts the broker settings from the console configuration.
    #[must_use]
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            url: config.broker_url.clone(),
            connect_timeout: config.broker_connect_timeout(),
            reconnect_base: Duration::from_millis(config.broker_reconnect_base_ms),
            reconnect_max: Duration::from_millis(config.broker_reconnect_max_ms),
            outbox_capacity: config.broker_outbox_capacity,
        }
    }
}

#[derive(Debug)]
struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<mpsc::Receiver<String>>,
}

#[derive(Debug)]
struct SupervisorSlot {
    outbox: Option<mpsc::Receiver<String>>,
    running: Option<Running>,
}

/// Client for the topic broker.
///
/// Shared as `Arc<BrokerClient>`; every method takes `&self`.
#[derive(Debug)]
pub struct BrokerClient<T: Transport = WsTransport> {
    transport: Arc<T>,
    settings: BrokerSettings,
    bus: EventBus,
    state: Arc<watch::Sender<ConnectionState>>,
    outbox: mpsc::Sender<String>,
    slot: Mutex<SupervisorSlot>,
}

impl BrokerClient<WsTransport> {
    /// Creates a WebSocket client from the console configuration.
    #[must_use]
    pub fn from_config(config: &ConsoleConfig, bus: EventBus) -> Self {
        Self::new(WsTransport, BrokerSettings::from_config(config), bus)
    }
}

impl<T: Transport> BrokerClient<T> {
    /// Creates a disconnected client publishing decoded events on `bus`.
    #[must_use]
    pub fn new(transport: T, settings: BrokerSettings, bus: EventBus) -> Self {
        let (outbox, outbox_rx) = mpsc::channel(settings.outbox_capacity.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport: Arc::new(transport),
            settings,
            bus,
            state: Arc::new(state),
            outbox,
            slot: Mutex::new(SupervisorSlot {
                outbox: Some(outbox_rx),
                running: None,
            }),
        }
    }

    /// Starts the connection supervisor and waits for its first attempt.
    ///
    /// Returns `Ok(())` immediately if the supervisor is already running.
    /// When the first attempt fails the supervisor keeps retrying in the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns the error of the first connection attempt
    /// ([`ConsoleError::Transport`] or [`ConsoleError::ConnectTimeout`]).
    pub async fn connect(&self) -> Result<(), ConsoleError> {
        let mut slot = self.slot.lock().await;
        if slot.running.is_some() {
            return Ok(());
        }
        let Some(outbox) = slot.outbox.take() else {
            return Err(ConsoleError::Internal(
                "broker outbox is no longer available".to_string(),
            ));
        };

        let (first_tx, first_rx) = oneshot::channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let supervisor = Supervisor {
            transport: Arc::clone(&self.transport),
            settings: self.settings.clone(),
            bus: self.bus.clone(),
            state: Arc::clone(&self.state),
            outbox,
        };
        let handle = tokio::spawn(supervisor.run(shutdown_rx, first_tx));
        slot.running = Some(Running { shutdown, handle });
        drop(slot);

        first_rx.await.unwrap_or_else(|_| {
            Err(ConsoleError::Transport(
                "connection cancelled before the first attempt completed".to_string(),
            ))
        })
    }

    /// Stops the supervisor and closes the current session, if any.
    ///
    /// Emits [`BrokerEvent::Disconnected`] if a session was open. Calling it
    /// on a stopped client does nothing.
    pub async fn disconnect(&self) {
        let mut slot = self.slot.lock().await;
        let Some(running) = slot.running.take() else {
            return;
        };
        running.shutdown.send_replace(true);
        match running.handle.await {
            Ok(outbox) => slot.outbox = Some(outbox),
            Err(e) => tracing::error!(error = %e, "broker supervisor terminated abnormally"),
        }
        tracing::info!("broker client stopped");
    }

    /// Publishes `payload` on `topic` without blocking.
    ///
    /// While disconnected, or when the outbound queue is full, the message
    /// is dropped with a warning and [`PublishOutcome::Dropped`] is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Serialization`] if the payload cannot be
    /// serialized.
    pub fn publish<P: Serialize + ?Sized>(
        &self,
        topic: &str,
        payload: &P,
    ) -> Result<PublishOutcome, ConsoleError> {
        if !self.is_connected() {
            tracing::warn!(topic, "broker disconnected, dropping publish");
            return Ok(PublishOutcome::Dropped);
        }
        let frame = ClientFrame::publish(topic, serde_json::to_value(payload)?);
        let text = serde_json::to_string(&frame)?;
        match self.outbox.try_send(text) {
            Ok(()) => Ok(PublishOutcome::Queued),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(topic, "broker outbox full, dropping publish");
                Ok(PublishOutcome::Dropped)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(topic, "broker outbox closed, dropping publish");
                Ok(PublishOutcome::Dropped)
            }
        }
    }

    /// Observer of decoded events and connection transitions. May lag;
    /// the store is fed separately and losslessly.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BrokerEvent> {
        self.bus.subscribe()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns `true` while a session is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Observes connection state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

enum SessionEnd {
    Lost,
    Shutdown,
}

struct Supervisor<T: Transport> {
    transport: Arc<T>,
    settings: BrokerSettings,
    bus: EventBus,
    state: Arc<watch::Sender<ConnectionState>>,
    outbox: mpsc::Receiver<String>,
}

impl<T: Transport> Supervisor<T> {
    async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        first: oneshot::Sender<Result<(), ConsoleError>>,
    ) -> mpsc::Receiver<String> {
        let mut first = Some(first);
        let mut backoff = Backoff::new(self.settings.reconnect_base, self.settings.reconnect_max);

        loop {
            self.set_state(ConnectionState::Connecting);
            let attempt = tokio::select! {
                result = self.open() => result,
                _ = shutdown.changed() => break,
            };

            match attempt {
                Ok(conn) => {
                    backoff.reset();
                    tracing::info!(url = %self.settings.url, "broker connected");
                    self.set_state(ConnectionState::Connected);
                    self.bus.publish(BrokerEvent::Connected);
                    if let Some(tx) = first.take() {
                        let _ = tx.send(Ok(()));
                    }

                    let end = self.session(conn, &mut shutdown).await;
                    self.discard_outbox();
                    self.set_state(ConnectionState::Disconnected);
                    self.bus.publish(BrokerEvent::Disconnected);
                    if matches!(end, SessionEnd::Shutdown) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attempt = backoff.attempt().saturating_add(1),
                        "broker connection attempt failed"
                    );
                    self.set_state(ConnectionState::Disconnected);
                    if let Some(tx) = first.take() {
                        let _ = tx.send(Err(e));
                    }
                }
            }

            let delay = backoff.next_delay();
            tracing::debug!(delay_ms = delay.as_millis(), "waiting before reconnect");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.set_state(ConnectionState::Disconnected);
        self.outbox
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    async fn open(&self) -> Result<T::Conn, ConsoleError> {
        let timeout = self.settings.connect_timeout;
        let mut conn = tokio::time::timeout(timeout, self.transport.connect(&self.settings.url))
            .await
            .map_err(|_| ConsoleError::ConnectTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        let subscribe = serde_json::to_string(&ClientFrame::subscribe(InboundTopic::all_topics()))?;
        conn.send(subscribe).await?;
        Ok(conn)
    }

    async fn session(
        &mut self,
        mut conn: T::Conn,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SessionEnd {
        loop {
            tokio::select! {
                frame = conn.recv() => match frame {
                    Some(Ok(text)) => self.handle_frame(&text),
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "broker connection lost");
                        return SessionEnd::Lost;
                    }
                    None => {
                        tracing::warn!("broker closed the connection");
                        return SessionEnd::Lost;
                    }
                },
                outgoing = self.outbox.recv() => {
                    let Some(text) = outgoing else {
                        conn.close().await;
                        return SessionEnd::Shutdown;
                    };
                    if let Err(e) = conn.send(text).await {
                        tracing::warn!(error = %e, "broker send failed");
                        return SessionEnd::Lost;
                    }
                }
                _ = shutdown.changed() => {
                    conn.close().await;
                    return SessionEnd::Shutdown;
                }
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        let frame = match serde_json::from_str::<ServerFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed broker frame");
                return;
            }
        };
        let ServerFrame::Message { topic, payload } = frame else {
            tracing::debug!("ignoring non-message broker frame");
            return;
        };
        match codec::decode(&topic, payload) {
            Ok(Some(event)) => {
                self.bus.publish(event);
            }
            Ok(None) => tracing::debug!(topic = %topic, "ignoring message on unhandled topic"),
            Err(e) => tracing::warn!(topic = %topic, error = %e, "dropping malformed broker message"),
        }
    }

    fn discard_outbox(&mut self) {
        let mut dropped = 0_usize;
        while self.outbox.try_recv().is_ok() {
            dropped = dropped.saturating_add(1);
        }
        if dropped > 0 {
            tracing::warn!(dropped, "discarded publishes queued before disconnect");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::domain::EntityId;

    struct Peer {
        to_client: mpsc::UnboundedSender<String>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    #[derive(Default)]
    struct Knobs {
        refuse: AtomicBool,
        stall: AtomicBool,
        attempts: AtomicUsize,
    }

    struct MemoryTransport {
        knobs: Arc<Knobs>,
        peers: mpsc::UnboundedSender<Peer>,
    }

    struct MemoryConn {
        incoming: mpsc::UnboundedReceiver<String>,
        outgoing: mpsc::UnboundedSender<String>,
    }

    impl Transport for MemoryTransport {
        type Conn = MemoryConn;

        async fn connect(&self, _url: &str) -> Result<MemoryConn, ConsoleError> {
            self.knobs.attempts.fetch_add(1, Ordering::SeqCst);
            if self.knobs.stall.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.knobs.refuse.load(Ordering::SeqCst) {
                return Err(ConsoleError::Transport("connection refused".to_string()));
            }
            let (to_client, incoming) = mpsc::unbounded_channel();
            let (outgoing, from_client) = mpsc::unbounded_channel();
            let _ = self.peers.send(Peer {
                to_client,
                from_client,
            });
            Ok(MemoryConn { incoming, outgoing })
        }
    }

    impl Connection for MemoryConn {
        async fn send(&mut self, text: String) -> Result<(), ConsoleError> {
            self.outgoing
                .send(text)
                .map_err(|_| ConsoleError::Transport("peer gone".to_string()))
        }

        async fn recv(&mut self) -> Option<Result<String, ConsoleError>> {
            self.incoming.recv().await.map(Ok)
        }

        async fn close(&mut self) {
            self.incoming.close();
        }
    }

    struct Harness {
        client: BrokerClient<MemoryTransport>,
        knobs: Arc<Knobs>,
        peers: mpsc::UnboundedReceiver<Peer>,
        events: broadcast::Receiver<BrokerEvent>,
    }

    fn harness(connect_timeout: Duration) -> Harness {
        let knobs = Arc::new(Knobs::default());
        let (peers_tx, peers) = mpsc::unbounded_channel();
        let bus = EventBus::new(64);
        let settings = BrokerSettings {
            url: "memory://broker".to_string(),
            connect_timeout,
            reconnect_base: Duration::from_millis(10),
            reconnect_max: Duration::from_millis(40),
            outbox_capacity: 8,
        };
        let transport = MemoryTransport {
            knobs: Arc::clone(&knobs),
            peers: peers_tx,
        };
        let client = BrokerClient::new(transport, settings, bus);
        let events = client.subscribe();
        Harness {
            client,
            knobs,
            peers,
            events,
        }
    }

    async fn next_event(rx: &mut broadcast::Receiver<BrokerEvent>) -> BrokerEvent {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Ok(event)) => event,
            other => panic!("expected an event, got {other:?}"),
        }
    }

    async fn next_peer(peers: &mut mpsc::UnboundedReceiver<Peer>) -> Peer {
        match tokio::time::timeout(Duration::from_secs(2), peers.recv()).await {
            Ok(Some(peer)) => peer,
            _ => panic!("expected a connection"),
        }
    }

    async fn next_frame(peer: &mut Peer) -> ClientFrame {
        let Ok(Some(text)) =
            tokio::time::timeout(Duration::from_secs(2), peer.from_client.recv()).await
        else {
            panic!("expected a frame from the client");
        };
        let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) else {
            panic!("client sent an invalid frame: {text}");
        };
        frame
    }

    #[tokio::test]
    async fn connect_subscribes_and_announces_once() {
        let mut h = harness(Duration::from_secs(1));
        let result = h.client.connect().await;
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(h.client.state(), ConnectionState::Connected);

        let mut peer = next_peer(&mut h.peers).await;
        let ClientFrame::Subscribe { topics } = next_frame(&mut peer).await else {
            panic!("first frame must subscribe");
        };
        assert_eq!(topics, InboundTopic::all_topics());
        assert_eq!(next_event(&mut h.events).await, BrokerEvent::Connected);

        assert!(h.client.connect().await.is_ok());
        assert_eq!(h.knobs.attempts.load(Ordering::SeqCst), 1);

        h.client.disconnect().await;
        assert_eq!(next_event(&mut h.events).await, BrokerEvent::Disconnected);
        assert_eq!(h.client.state(), ConnectionState::Disconnected);

        h.client.disconnect().await;
        assert!(matches!(
            h.events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn inbound_messages_are_decoded_in_order() {
        let mut h = harness(Duration::from_secs(1));
        assert!(h.client.connect().await.is_ok());
        let peer = next_peer(&mut h.peers).await;
        assert_eq!(next_event(&mut h.events).await, BrokerEvent::Connected);

        let frames = [
            "not json".to_string(),
            json!({"type": "message", "topic": "security/events/new", "payload": {"id": 1}})
                .to_string(),
            json!({"type": "message", "topic": "security/events/update", "payload": {}})
                .to_string(),
            json!({"type": "ack"}).to_string(),
            json!({"type": "message", "topic": "security/events/new", "payload": {"id": 2}})
                .to_string(),
        ];
        for frame in frames {
            assert!(peer.to_client.send(frame).is_ok());
        }

        let mut ids = Vec::new();
        for _ in 0..2 {
            let BrokerEvent::EventNew(event) = next_event(&mut h.events).await else {
                panic!("expected event:new");
            };
            ids.push(event.id);
        }
        assert_eq!(
            ids,
            vec![Some(EntityId::from(1_u64)), Some(EntityId::from(2_u64))]
        );
        h.client.disconnect().await;
    }

    #[tokio::test]
    async fn publish_is_dropped_while_disconnected() {
        let mut h = harness(Duration::from_secs(1));
        let outcome = h.client.publish("camera/cam-1/frame", &json!({"frame": "AA"}));
        assert!(matches!(outcome, Ok(PublishOutcome::Dropped)));

        assert!(h.client.connect().await.is_ok());
        let mut peer = next_peer(&mut h.peers).await;
        let _ = next_frame(&mut peer).await;

        let outcome = h.client.publish("camera/cam-1/frame", &json!({"frame": "AA"}));
        assert!(matches!(outcome, Ok(PublishOutcome::Queued)));
        let ClientFrame::Publish { topic, payload, .. } = next_frame(&mut peer).await else {
            panic!("expected a publish frame");
        };
        assert_eq!(topic, "camera/cam-1/frame");
        assert_eq!(payload, json!({"frame": "AA"}));
        h.client.disconnect().await;
    }

    #[tokio::test]
    async fn reconnects_after_connection_loss() {
        let mut h = harness(Duration::from_secs(1));
        assert!(h.client.connect().await.is_ok());
        let peer = next_peer(&mut h.peers).await;
        assert_eq!(next_event(&mut h.events).await, BrokerEvent::Connected);

        drop(peer);
        assert_eq!(next_event(&mut h.events).await, BrokerEvent::Disconnected);
        assert_eq!(next_event(&mut h.events).await, BrokerEvent::Connected);
        assert_eq!(h.knobs.attempts.load(Ordering::SeqCst), 2);
        h.client.disconnect().await;
    }

    #[tokio::test]
    async fn failed_first_attempt_is_reported_and_retried() {
        let mut h = harness(Duration::from_secs(1));
        h.knobs.refuse.store(true, Ordering::SeqCst);

        let result = h.client.connect().await;
        assert!(matches!(result, Err(ConsoleError::Transport(_))));
        assert_ne!(h.client.state(), ConnectionState::Connected);

        h.knobs.refuse.store(false, Ordering::SeqCst);
        assert_eq!(next_event(&mut h.events).await, BrokerEvent::Connected);
        assert!(h.knobs.attempts.load(Ordering::SeqCst) >= 2);
        h.client.disconnect().await;
    }

    #[tokio::test]
    async fn stalled_attempt_times_out() {
        let mut h = harness(Duration::from_millis(20));
        h.knobs.stall.store(true, Ordering::SeqCst);
        let result = h.client.connect().await;
        assert!(matches!(
            result,
            Err(ConsoleError::ConnectTimeout { timeout_ms: 20 })
        ));
        h.client.disconnect().await;
        assert!(h.events.try_recv().is_err());
    }
}
