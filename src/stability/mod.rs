//! Temporal smoothing of per-frame overlay readings.
//!
//! See [`StabilityTracker`] for the algorithm.

pub mod tracker;

pub use tracker::{
    AttributeReading, CameraStability, OverlayAttribute, STABILITY_CAP, StabilityTracker,
};
