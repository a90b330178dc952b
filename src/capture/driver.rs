//! The capture task and its control handle.
//!
//! [`spawn_capture`] moves a [`CaptureLoop`] onto its own task. The task
//! ticks at the loop's cadence while streaming, reads the latest overlay
//! annotations for its camera from the [`StateStore`], and reacts to
//! [`CaptureCommand`]s sent through a [`CaptureControl`].

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use super::capture_loop::{
    CaptureLoop, CaptureState, CaptureStats, FramePublisher, StopHandle, TickOutcome,
};
use super::sink::RenderSink;
use super::source::CaptureSource;
use crate::error::{CaptureError, ConsoleError};
use crate::store::StateStore;

const COMMAND_QUEUE: usize = 16;

/// Command accepted by the capture task.
#[derive(Debug)]
pub enum CaptureCommand {
    /// Acquire the source and start streaming; the outcome is sent back.
    Start(oneshot::Sender<Result<(), CaptureError>>),
    /// Stop streaming and release the source.
    Stop,
    /// Turn frame publishing on or off.
    SetPublishing(bool),
}

/// Snapshot of the capture task, refreshed after every command and tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStatus {
    /// Camera id frames are published under.
    pub camera_id: String,
    /// Outbound topic.
    pub topic: String,
    /// Lifecycle state.
    pub state: CaptureState,
    /// Whether sampled frames are published.
    pub publishing: bool,
    /// Render and publish counters.
    pub stats: CaptureStats,
    /// Message of the last failed start, cleared by a successful one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl CaptureStatus {
    fn of<S: CaptureSource, K: RenderSink, P: FramePublisher>(
        capture: &CaptureLoop<S, K, P>,
        last_error: Option<String>,
    ) -> Self {
        Self {
            camera_id: capture.camera_id().to_string(),
            topic: capture.topic().to_string(),
            state: capture.state(),
            publishing: capture.publishing(),
            stats: capture.stats(),
            last_error,
        }
    }
}

/// Cloneable handle to the capture task.
#[derive(Debug, Clone)]
pub struct CaptureControl {
    commands: mpsc::Sender<CaptureCommand>,
    status: watch::Receiver<CaptureStatus>,
    stop: StopHandle,
}

impl CaptureControl {
    /// Starts capturing and waits for the source to be acquired.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Capture`] if the loop is not idle or the
    /// source cannot be acquired, and [`ConsoleError::Internal`] if the
    /// capture task has exited.
    pub async fn start(&self) -> Result<(), ConsoleError> {
        let (reply, outcome) = oneshot::channel();
        self.send(CaptureCommand::Start(reply)).await?;
        outcome
            .await
            .map_err(|_| ConsoleError::Internal("capture task dropped the request".to_string()))?
            .map_err(ConsoleError::from)
    }

    /// Stops capturing. A start still acquiring its source is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Internal`] if the capture task has exited.
    pub async fn stop(&self) -> Result<(), ConsoleError> {
        self.stop.request_stop();
        self.send(CaptureCommand::Stop).await
    }

    /// Turns frame publishing on or off.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Internal`] if the capture task has exited.
    pub async fn set_publishing(&self, enabled: bool) -> Result<(), ConsoleError> {
        self.send(CaptureCommand::SetPublishing(enabled)).await
    }

    /// Latest status snapshot.
    #[must_use]
    pub fn status(&self) -> CaptureStatus {
        self.status.borrow().clone()
    }

    /// Observes status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<CaptureStatus> {
        self.status.clone()
    }

    async fn send(&self, command: CaptureCommand) -> Result<(), ConsoleError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ConsoleError::Internal("capture task is not running".to_string()))
    }
}

/// Spawns the capture task for `capture`.
///
/// The task runs until every [`CaptureControl`] clone is dropped; the
/// source is released when it ends.
pub fn spawn_capture<S, K, P>(
    capture: CaptureLoop<S, K, P>,
    store: Arc<RwLock<StateStore>>,
) -> (CaptureControl, JoinHandle<()>)
where
    S: CaptureSource,
    K: RenderSink,
    P: FramePublisher,
{
    let (commands, commands_rx) = mpsc::channel(COMMAND_QUEUE);
    let (status_tx, status) = watch::channel(CaptureStatus::of(&capture, None));
    let control = CaptureControl {
        commands,
        status,
        stop: capture.stop_handle(),
    };
    let handle = tokio::spawn(run_capture(capture, store, commands_rx, status_tx));
    (control, handle)
}

async fn run_capture<S, K, P>(
    mut capture: CaptureLoop<S, K, P>,
    store: Arc<RwLock<StateStore>>,
    mut commands: mpsc::Receiver<CaptureCommand>,
    status: watch::Sender<CaptureStatus>,
) where
    S: CaptureSource,
    K: RenderSink,
    P: FramePublisher,
{
    let mut ticker: Option<Interval> = None;
    let mut last_error: Option<String> = None;

    loop {
        let mut answer = None;
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    CaptureCommand::Start(reply) => {
                        let result = capture.start().await;
                        last_error = result.as_ref().err().map(ToString::to_string);
                        ticker = (capture.state() == CaptureState::Streaming)
                            .then(|| ticker_for(&capture));
                        answer = Some((reply, result));
                    }
                    CaptureCommand::Stop => {
                        capture.stop();
                        ticker = None;
                    }
                    CaptureCommand::SetPublishing(enabled) => {
                        capture.set_publishing(enabled);
                        tracing::info!(enabled, "capture publishing toggled");
                    }
                }
            }
            () = next_tick(&mut ticker) => {
                let annotations = store.read().await.annotations(capture.camera_id());
                if capture.tick(Instant::now(), &annotations).await == TickOutcome::Inactive {
                    capture.stop();
                    ticker = None;
                }
            }
        }
        status.send_replace(CaptureStatus::of(&capture, last_error.clone()));
        if let Some((reply, result)) = answer {
            let _ = reply.send(result);
        }
    }

    capture.stop();
    tracing::debug!("capture task finished");
}

fn ticker_for<S, K, P>(capture: &CaptureLoop<S, K, P>) -> Interval
where
    S: CaptureSource,
    K: RenderSink,
    P: FramePublisher,
{
    let period = capture.tick_interval();
    tracing::debug!(period_ms = period.as_millis(), "capture tick schedule");
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
