//! Applies decoded broker events to the store.
//!
//! The dispatcher is the only writer for broker-sourced mutations. It
//! drains the [`EventBus`] store feed in FIFO order, so events on the same
//! topic are applied in the order they arrived and none is skipped.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::domain::StoreFeed;
use crate::store::StateStore;

/// Spawns the dispatcher over `feed`.
///
/// Take the feed from [`EventBus::with_store_feed`] before connecting the
/// broker so the first `Connected` notification is queued for the store.
///
/// [`EventBus::with_store_feed`]: crate::domain::EventBus::with_store_feed
pub fn spawn_dispatcher(feed: StoreFeed, store: Arc<RwLock<StateStore>>) -> JoinHandle<()> {
    tokio::spawn(run_dispatcher(feed, store))
}

/// Applies every event from `feed` until all bus handles are dropped.
pub async fn run_dispatcher(mut feed: StoreFeed, store: Arc<RwLock<StateStore>>) {
    while let Some(event) = feed.recv().await {
        tracing::trace!(topic = ?event.topic(), "dispatching broker event");
        store.write().await.apply(event);
    }
    tracing::debug!("dispatcher stopped");
}
