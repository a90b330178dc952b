//! Local capture: acquire frames, render annotations, publish samples.
//!
//! A [`CaptureSource`] yields JPEG frames, a [`RenderSink`] receives the
//! frame plus overlay boxes and stability badges, and sampled frames go out
//! through a [`FramePublisher`] on `camera/{id}/frame`. [`spawn_capture`]
//! runs a [`CaptureLoop`] on its own task behind a [`CaptureControl`].

pub mod capture_loop;
pub mod driver;
pub mod sink;
pub mod source;
pub mod throttle;

pub use capture_loop::{
    CaptureLoop, CaptureSettings, CaptureState, CaptureStats, FramePayload, FramePublisher,
    StopHandle, TickOutcome,
};
pub use driver::{CaptureCommand, CaptureControl, CaptureStatus, spawn_capture};
pub use sink::{
    LabelBox, OverlayDrawing, RenderSink, TracingSink, badge_text, layout_overlay, overlay_lines,
    stability_badges,
};
pub use source::{CaptureSource, Frame, ImageDirSource};
pub use throttle::PublishThrottle;
