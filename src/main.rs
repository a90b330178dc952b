//! vigil-console entry point.
//!
//! Wires the broker client, dispatcher, HTTP sync, capture task and the
//! status API, then serves until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vigil_console::api;
use vigil_console::app_state::AppState;
use vigil_console::broker::BrokerClient;
use vigil_console::capture::{
    CaptureControl, CaptureLoop, CaptureSettings, ImageDirSource, TracingSink, spawn_capture,
};
use vigil_console::config::{ConsoleConfig, LogFormat};
use vigil_console::domain::EventBus;
use vigil_console::http_client::ApiClient;
use vigil_console::service::{spawn_dispatcher, spawn_sync};
use vigil_console::store::StateStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let format = LogFormat::from_env();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    // Load configuration
    let config = ConsoleConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(
        addr = %config.listen_addr,
        broker = %config.broker_url,
        api = %config.api_base_url,
        "starting vigil-console"
    );

    // State and event fan-out; the store feed exists before the broker
    // connects so the first Connected event reaches the store.
    let store = Arc::new(RwLock::new(StateStore::new()));
    let (event_bus, store_feed) = EventBus::with_store_feed(config.event_bus_capacity);
    let dispatcher = spawn_dispatcher(store_feed, Arc::clone(&store));

    let broker = Arc::new(BrokerClient::from_config(&config, event_bus));
    if let Err(e) = broker.connect().await {
        tracing::warn!(error = %e, "initial broker connection failed, retrying in background");
    }

    // HTTP collaborator
    let api_client = ApiClient::from_config(&config).context("building HTTP client")?;
    let sync = spawn_sync(
        api_client,
        Arc::clone(&store),
        Duration::from_secs(config.api_refresh_secs),
    );

    // Local capture
    let capture = start_capture(&config, &broker, &store).await;

    // Build application state and router
    let app_state = AppState {
        store,
        broker_state: broker.watch_state(),
        capture,
    };
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving status API")?;

    // Shutdown
    tracing::info!("shutting down");
    sync.abort();
    broker.disconnect().await;
    dispatcher.abort();

    Ok(())
}

/// Spawns the capture task when `CAPTURE_DIR` is set, starting it right away
/// if `CAPTURE_AUTOSTART` is on.
async fn start_capture(
    config: &ConsoleConfig,
    broker: &Arc<BrokerClient>,
    store: &Arc<RwLock<StateStore>>,
) -> Option<CaptureControl> {
    let Some(dir) = config.capture_dir.clone() else {
        tracing::info!("no CAPTURE_DIR set, local capture disabled");
        return None;
    };

    let capture = CaptureLoop::new(
        ImageDirSource::new(dir),
        TracingSink::new(),
        Arc::clone(broker),
        &CaptureSettings::from_config(config),
    );
    let (control, _task) = spawn_capture(capture, Arc::clone(store));

    if config.capture_autostart
        && let Err(e) = control.start().await
    {
        tracing::warn!(error = %e, "capture autostart failed");
    }
    Some(control)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
