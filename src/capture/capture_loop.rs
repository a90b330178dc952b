//! The capture state machine.
//!
//! ```text
//! Idle ──start()──▶ Starting ──acquired──▶ Streaming ──stop()──▶ Stopping ──▶ Idle
//!                      │                                  ▲
//!                      └──acquire failed / stop requested─┴──▶ Idle
//! ```
//!
//! Rendering happens on every tick; publishing is sampled independently
//! through a [`PublishThrottle`]. The shared active flag is checked before
//! any work on a tick, so a stop issued through a [`StopHandle`] takes
//! effect without waiting for the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use base64::Engine;
use chrono::Utc;
use serde::Serialize;

use super::sink::{RenderSink, layout_overlay, stability_badges};
use super::source::{CaptureSource, Frame};
use super::throttle::PublishThrottle;
use crate::broker::{BrokerClient, PublishOutcome, Transport};
use crate::config::ConsoleConfig;
use crate::domain::{EntityId, Overlay, frame_topic};
use crate::error::{CaptureError, ConsoleError};
use crate::store::Annotations;

/// Lifecycle state of a [`CaptureLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// Source released; nothing runs.
    Idle,
    /// Waiting for the source to be acquired.
    Starting,
    /// Rendering every tick and publishing when sampled.
    Streaming,
    /// Releasing the source.
    Stopping,
}

/// Body published on `camera/{id}/frame`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FramePayload {
    /// Base64-encoded JPEG.
    pub frame: String,
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
    /// Overlays drawn on the frame, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlays: Option<Vec<Overlay>>,
}

/// Non-blocking outbound seam for captured frames.
pub trait FramePublisher: Send + Sync + 'static {
    /// Hands one frame to the outbound path without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Serialization`] if the payload cannot be
    /// encoded.
    fn publish_frame(
        &self,
        topic: &str,
        payload: &FramePayload,
    ) -> Result<PublishOutcome, ConsoleError>;
}

impl<T: Transport> FramePublisher for BrokerClient<T> {
    fn publish_frame(
        &self,
        topic: &str,
        payload: &FramePayload,
    ) -> Result<PublishOutcome, ConsoleError> {
        self.publish(topic, payload)
    }
}

/// Tunables of the capture loop.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Camera id frames are published under.
    pub camera_id: String,
    /// Tick interval when the source reports no frame rate.
    pub render_interval: Duration,
    /// Minimum interval between two published frames.
    pub publish_interval: Duration,
    /// Whether publishing is on when the loop is created.
    pub publish_enabled: bool,
}

impl CaptureSettings {
    /// Extracts the capture settings from the console configuration.
    #[must_use]
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            camera_id: config.capture_id.clone(),
            render_interval: config.capture_render_interval(),
            publish_interval: config.capture_publish_interval(),
            publish_enabled: config.capture_publish_enabled,
        }
    }
}

/// Counters exposed by the status API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStats {
    /// Ticks that rendered a frame.
    pub frames_rendered: u64,
    /// Frames handed to the publisher and queued.
    pub frames_published: u64,
    /// Ticks whose drawing failed.
    pub render_errors: u64,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The loop is not streaming.
    Inactive,
    /// The source had no frame ready.
    NoFrame,
    /// A frame was rendered and possibly published.
    Rendered {
        /// Whether the frame was also queued for publishing.
        published: bool,
    },
}

/// Requests a stop from outside the task that owns the loop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    active: Arc<AtomicBool>,
}

impl StopHandle {
    /// Clears the active flag. Idempotent.
    pub fn request_stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Returns `true` while the loop is starting or streaming.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Drives one capture source through render and publish.
#[derive(Debug)]
pub struct CaptureLoop<S: CaptureSource, K: RenderSink, P: FramePublisher> {
    source: S,
    sink: K,
    publisher: Arc<P>,
    camera_id: EntityId,
    topic: String,
    render_interval: Duration,
    throttle: PublishThrottle,
    publishing: bool,
    state: CaptureState,
    active: Arc<AtomicBool>,
    stats: CaptureStats,
}

impl<S: CaptureSource, K: RenderSink, P: FramePublisher> CaptureLoop<S, K, P> {
    /// Creates an idle loop.
    #[must_use]
    pub fn new(source: S, sink: K, publisher: Arc<P>, settings: &CaptureSettings) -> Self {
        Self {
            source,
            sink,
            publisher,
            camera_id: EntityId::new(settings.camera_id.as_str()),
            topic: frame_topic(&settings.camera_id),
            render_interval: settings.render_interval,
            throttle: PublishThrottle::new(settings.publish_interval),
            publishing: settings.publish_enabled,
            state: CaptureState::Idle,
            active: Arc::new(AtomicBool::new(false)),
            stats: CaptureStats::default(),
        }
    }

    /// Acquires the source and enters [`CaptureState::Streaming`].
    ///
    /// If a stop is requested through a [`StopHandle`] while the source is
    /// being acquired, the source is released again and the loop returns to
    /// [`CaptureState::Idle`].
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidState`] unless the loop is idle, and
    /// [`CaptureError::Acquire`] if the source cannot be opened; the loop is
    /// then idle again.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::InvalidState(format!(
                "cannot start while {}",
                self.state.as_str()
            )));
        }
        self.state = CaptureState::Starting;
        self.active.store(true, Ordering::SeqCst);

        if let Err(e) = self.source.acquire().await {
            self.active.store(false, Ordering::SeqCst);
            self.state = CaptureState::Idle;
            tracing::warn!(error = %e, "capture start failed");
            return Err(e);
        }

        if !self.active.load(Ordering::SeqCst) {
            self.source.release();
            self.state = CaptureState::Idle;
            tracing::info!("capture stopped while starting");
            return Ok(());
        }

        self.state = CaptureState::Streaming;
        tracing::info!(topic = %self.topic, publishing = self.publishing, "capture streaming");
        Ok(())
    }

    /// Clears the active flag, releases the source, and returns to
    /// [`CaptureState::Idle`]. Does nothing when already idle.
    pub fn stop(&mut self) {
        if self.state == CaptureState::Idle {
            return;
        }
        self.state = CaptureState::Stopping;
        self.active.store(false, Ordering::SeqCst);
        self.source.release();
        self.state = CaptureState::Idle;
        tracing::info!("capture stopped");
    }

    /// Runs one render tick at `now`, drawing `annotations` over the frame.
    pub async fn tick(&mut self, now: Instant, annotations: &Annotations) -> TickOutcome {
        if !self.is_streaming() {
            return TickOutcome::Inactive;
        }

        let frame = match self.source.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return TickOutcome::NoFrame,
            Err(e) => {
                tracing::warn!(error = %e, "capture read failed");
                return TickOutcome::NoFrame;
            }
        };
        if !self.is_streaming() {
            return TickOutcome::Inactive;
        }

        if let Err(e) = self.render(&frame, annotations) {
            self.stats.render_errors = self.stats.render_errors.saturating_add(1);
            tracing::warn!(error = %e, "render failed, skipping annotations for this tick");
        } else {
            self.stats.frames_rendered = self.stats.frames_rendered.saturating_add(1);
        }

        let published = self.publish_sampled(now, &frame, annotations);
        TickOutcome::Rendered { published }
    }

    fn is_streaming(&self) -> bool {
        self.active.load(Ordering::SeqCst) && self.state == CaptureState::Streaming
    }

    fn render(&mut self, frame: &Frame, annotations: &Annotations) -> Result<(), CaptureError> {
        self.sink.draw_frame(frame)?;
        for overlay in &annotations.overlays {
            self.sink.draw_overlay(&layout_overlay(overlay))?;
        }
        self.sink
            .draw_badges(&stability_badges(&annotations.stability))
    }

    fn publish_sampled(&mut self, now: Instant, frame: &Frame, annotations: &Annotations) -> bool {
        if !self.publishing || !self.throttle.try_acquire(now) {
            return false;
        }
        let payload = FramePayload {
            frame: base64::engine::general_purpose::STANDARD.encode(&frame.jpeg),
            timestamp: Utc::now().timestamp_millis(),
            overlays: (!annotations.overlays.is_empty()).then(|| annotations.overlays.clone()),
        };
        match self.publisher.publish_frame(&self.topic, &payload) {
            Ok(PublishOutcome::Queued) => {
                self.stats.frames_published = self.stats.frames_published.saturating_add(1);
                true
            }
            Ok(PublishOutcome::Dropped) => false,
            Err(e) => {
                tracing::warn!(error = %e, "frame publish failed");
                false
            }
        }
    }

    /// Turns publishing on or off.
    ///
    /// The publish interval keeps counting from the last published frame,
    /// across toggles and restarts.
    pub fn set_publishing(&mut self, enabled: bool) {
        self.publishing = enabled;
    }

    /// Tick interval: the source's native cadence if it reports one,
    /// otherwise the configured render interval.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.source
            .frame_rate()
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map_or(self.render_interval, |fps| Duration::from_secs_f64(1.0 / fps))
    }

    /// Handle that can request a stop from another task.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            active: Arc::clone(&self.active),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// Whether sampled frames are published.
    #[must_use]
    pub const fn publishing(&self) -> bool {
        self.publishing
    }

    /// Render and publish counters.
    #[must_use]
    pub const fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Camera id the loop captures for.
    #[must_use]
    pub const fn camera_id(&self) -> &EntityId {
        &self.camera_id
    }

    /// Topic frames are published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl<S: CaptureSource, K: RenderSink, P: FramePublisher> Drop for CaptureLoop<S, K, P> {
    fn drop(&mut self) {
        if self.state != CaptureState::Idle {
            self.active.store(false, Ordering::SeqCst);
            self.source.release();
        }
    }
}

impl CaptureState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Streaming => "streaming",
            Self::Stopping => "stopping",
        }
    }
}
