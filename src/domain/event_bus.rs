//! Fan-out of decoded broker events.
//!
//! [`EventBus`] has two outlets:
//!
//! * a lossless **store feed**, an unbounded `mpsc` channel drained by the
//!   dispatcher, which is the only broker-side writer of the store. Every
//!   published event reaches it in publish order, including the
//!   `Connected`/`Disconnected` transitions.
//! * a bounded [`tokio::sync::broadcast`] channel for observers. A slow
//!   observer gets `Lagged(n)` and loses the oldest `n` events; the store
//!   feed is unaffected.

use tokio::sync::{broadcast, mpsc};

use super::BrokerEvent;

/// Receiving end of the store feed.
pub type StoreFeed = mpsc::UnboundedReceiver<BrokerEvent>;

/// Fan-out bus for [`BrokerEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BrokerEvent>,
    store_feed: Option<mpsc::UnboundedSender<BrokerEvent>>,
}

impl EventBus {
    /// Creates an observer-only bus with the given broadcast capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            store_feed: None,
        }
    }

    /// Creates a bus plus the lossless feed the dispatcher drains.
    ///
    /// The feed closes once every clone of the bus is dropped.
    #[must_use]
    pub fn with_store_feed(capacity: usize) -> (Self, StoreFeed) {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        let mut bus = Self::new(capacity);
        bus.store_feed = Some(feed_tx);
        (bus, feed_rx)
    }

    /// Publishes an event to the store feed and to every observer.
    ///
    /// Returns the number of observers that received the event.
    pub fn publish(&self, event: BrokerEvent) -> usize {
        if let Some(feed) = &self.store_feed
            && feed.send(event.clone()).is_err()
        {
            tracing::warn!(topic = ?event.topic(), "store feed closed, event not applied");
        }
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates an observer receiving all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BrokerEvent> {
        self.sender.subscribe()
    }

    /// Current number of observers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
