//! Periodic refresh of store slices from the HTTP collaborator.
//!
//! Each refresh fetches one resource and, only on success, replaces the
//! matching slice under a short write lock. Failures are logged and leave
//! the slice untouched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::LogEntry;
use crate::error::ConsoleError;
use crate::http_client::ApiClient;
use crate::store::StateStore;

/// Replaces the camera list. Returns the number of cameras loaded.
///
/// # Errors
///
/// Propagates the collaborator failure; the store is not touched.
pub async fn refresh_cameras(
    api: &ApiClient,
    store: &RwLock<StateStore>,
) -> Result<usize, ConsoleError> {
    let cameras = api.fetch_cameras().await?;
    let count = cameras.len();
    let mut store = store.write().await;
    store.set_cameras(cameras);
    store.add_log(LogEntry::api(format!("Fetched {count} cameras")));
    Ok(count)
}

/// Replaces the event feed. Returns the number of events loaded.
///
/// # Errors
///
/// Propagates the collaborator failure; the store is not touched.
pub async fn refresh_events(
    api: &ApiClient,
    store: &RwLock<StateStore>,
) -> Result<usize, ConsoleError> {
    let events = api.fetch_events().await?;
    let count = events.len();
    let mut store = store.write().await;
    store.set_events(events);
    store.add_log(LogEntry::api(format!("Fetched {count} events")));
    Ok(count)
}

/// Fetches backend health and recomputes the system status.
///
/// # Errors
///
/// Propagates the collaborator failure; the store is not touched.
pub async fn refresh_system_status(
    api: &ApiClient,
    store: &RwLock<StateStore>,
) -> Result<(), ConsoleError> {
    let status = api.fetch_health().await?;
    let mut store = store.write().await;
    store.add_log(LogEntry::api("Fetched /health"));
    store.refresh_system_status(status);
    Ok(())
}

/// Replaces the incident feed. Returns the number of incidents loaded.
///
/// # Errors
///
/// Propagates the collaborator failure; the store is not touched.
pub async fn refresh_incidents(
    api: &ApiClient,
    store: &RwLock<StateStore>,
) -> Result<usize, ConsoleError> {
    let incidents = api.fetch_incidents().await?;
    let count = incidents.len();
    let mut store = store.write().await;
    store.set_incidents(incidents);
    store.add_log(LogEntry::api("Fetched incidents"));
    Ok(count)
}

/// Runs every refresh once, cameras and events before the system status
/// that counts them. Returns how many refreshes failed.
pub async fn refresh_all(api: &ApiClient, store: &RwLock<StateStore>) -> usize {
    let results = [
        ("cameras", refresh_cameras(api, store).await.map(drop)),
        ("events", refresh_events(api, store).await.map(drop)),
        ("health", refresh_system_status(api, store).await),
        ("incidents", refresh_incidents(api, store).await.map(drop)),
    ];
    let mut failed = 0;
    for (resource, result) in results {
        if let Err(e) = result {
            failed += 1;
            tracing::warn!(resource, error = %e, "collaborator refresh failed");
        }
    }
    failed
}

/// Spawns the sync task: one refresh at startup, then one every `every`.
///
/// A zero `every` refreshes only once.
pub fn spawn_sync(
    api: ApiClient,
    store: Arc<RwLock<StateStore>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(base_url = api.base_url(), every_secs = every.as_secs(), "api sync started");
        if every.is_zero() {
            refresh_all(&api, &store).await;
            return;
        }
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let failed = refresh_all(&api, &store).await;
            tracing::debug!(failed, "api sync pass finished");
        }
    })
}
