//! Annotation layout and render sinks.
//!
//! [`layout_overlay`] turns one overlay into the box and label text to
//! draw: a label line with the rounded confidence percentage, an optional
//! second line (explanation, else `Status: x`, else `Activity: x`), and a
//! label box of [`LINE_HEIGHT`] per line placed above the bounding box and
//! clipped at the top edge. [`stability_badges`] formats the smoothed
//! door/latch/activity readings.

use serde::Serialize;

use super::source::Frame;
use crate::domain::{BoundingBox, Overlay};
use crate::error::CaptureError;
use crate::stability::{CameraStability, OverlayAttribute, STABILITY_CAP};

/// Height of one label line, in pixels.
pub const LINE_HEIGHT: f64 = 16.0;
/// Horizontal inset of label text inside its box.
pub const TEXT_INSET: f64 = 4.0;
/// Offset of the first text baseline below the label box top.
pub const TEXT_BASELINE: f64 = 12.0;

/// Label box drawn above an overlay's bounding box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelBox {
    /// Left edge; equals the bounding box's `x1`.
    pub x: f64,
    /// Top edge: `max(0, y1 - height)`.
    pub y: f64,
    /// `LINE_HEIGHT` times the number of lines.
    pub height: f64,
    /// Text lines, top to bottom.
    pub lines: Vec<String>,
}

impl LabelBox {
    /// Baseline position of each line, as `(x, y, text)`.
    pub fn text_positions(&self) -> impl Iterator<Item = (f64, f64, &str)> {
        self.lines.iter().zip(0_u32..).map(move |(line, i)| {
            (
                self.x + TEXT_INSET,
                self.y + TEXT_BASELINE + f64::from(i) * LINE_HEIGHT,
                line.as_str(),
            )
        })
    }
}

/// Everything drawn for one overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayDrawing {
    /// Rectangle outline.
    pub bbox: BoundingBox,
    /// Label placed above it.
    pub label: LabelBox,
}

/// Text lines of an overlay label.
#[must_use]
pub fn overlay_lines(overlay: &Overlay) -> Vec<String> {
    let main = match overlay.confidence {
        Some(confidence) => format!("{} {}%", overlay.label, (confidence * 100.0).round()),
        None => overlay.label.clone(),
    };
    let extra = overlay
        .explanation
        .clone()
        .filter(|e| !e.is_empty())
        .or_else(|| {
            overlay
                .status
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| format!("Status: {s}"))
        })
        .or_else(|| {
            overlay
                .activity
                .as_deref()
                .filter(|a| !a.is_empty())
                .map(|a| format!("Activity: {a}"))
        });
    let mut lines = vec![main];
    lines.extend(extra);
    lines
}

/// Lays out the box and label of one overlay.
#[must_use]
pub fn layout_overlay(overlay: &Overlay) -> OverlayDrawing {
    let lines = overlay_lines(overlay);
    let height = LINE_HEIGHT * f64::from(u32::try_from(lines.len()).unwrap_or(u32::MAX));
    OverlayDrawing {
        bbox: overlay.bbox,
        label: LabelBox {
            x: overlay.bbox.x1,
            y: (overlay.bbox.y1 - height).max(0.0),
            height,
            lines,
        },
    }
}

/// Formats one stability badge, e.g. `Door: open (stable 5/30)`.
#[must_use]
pub fn badge_text(attribute: OverlayAttribute, value: &str, stability: u8) -> String {
    if stability == 0 {
        format!("{}: {value}", attribute.title())
    } else {
        format!(
            "{}: {value} (stable {stability}/{STABILITY_CAP})",
            attribute.title()
        )
    }
}

/// Door, latch and activity badges for a camera.
#[must_use]
pub fn stability_badges(stability: &CameraStability) -> Vec<String> {
    OverlayAttribute::ALL
        .iter()
        .map(|&attribute| {
            let (value, count) = stability.display(attribute);
            badge_text(attribute, value, count)
        })
        .collect()
}

/// Destination of rendered frames and annotations.
pub trait RenderSink: Send + 'static {
    /// Draws the raw frame.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Render`] if drawing failed.
    fn draw_frame(&mut self, frame: &Frame) -> Result<(), CaptureError>;

    /// Draws one overlay box and its label.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Render`] if drawing failed.
    fn draw_overlay(&mut self, drawing: &OverlayDrawing) -> Result<(), CaptureError>;

    /// Draws the stability badges.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Render`] if drawing failed.
    fn draw_badges(&mut self, badges: &[String]) -> Result<(), CaptureError>;
}

/// Sink that records every draw call at trace level.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    frames: u64,
}

impl TracingSink {
    /// Creates a sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames drawn so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for TracingSink {
    fn draw_frame(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        self.frames = self.frames.saturating_add(1);
        tracing::trace!(bytes = frame.jpeg.len(), frame = self.frames, "draw frame");
        Ok(())
    }

    fn draw_overlay(&mut self, drawing: &OverlayDrawing) -> Result<(), CaptureError> {
        tracing::trace!(
            x = drawing.bbox.x1,
            y = drawing.bbox.y1,
            w = drawing.bbox.width(),
            h = drawing.bbox.height(),
            label = ?drawing.label.lines,
            "draw overlay"
        );
        Ok(())
    }

    fn draw_badges(&mut self, badges: &[String]) -> Result<(), CaptureError> {
        tracing::trace!(?badges, "draw badges");
        Ok(())
    }
}
