//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::broker::ConnectionState;
use crate::capture::CaptureControl;
use crate::error::{CaptureError, ConsoleError};
use crate::store::StateStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The console's model, written by the dispatcher and sync tasks.
    pub store: Arc<RwLock<StateStore>>,
    /// Broker connection state.
    pub broker_state: watch::Receiver<ConnectionState>,
    /// Capture task handle; `None` when no capture source is configured.
    pub capture: Option<CaptureControl>,
}

impl AppState {
    /// Capture handle, or an error when capture is not configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Capture`] when no capture source is set up.
    pub fn capture(&self) -> Result<&CaptureControl, ConsoleError> {
        self.capture.as_ref().ok_or_else(|| {
            ConsoleError::from(CaptureError::Acquire(
                "no capture source configured".to_string(),
            ))
        })
    }

    /// Current broker connection state.
    #[must_use]
    pub fn broker_state(&self) -> ConnectionState {
        *self.broker_state.borrow()
    }
}
