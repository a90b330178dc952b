//! Client-side state: bounded feeds and the [`StateStore`].

pub mod retention;
pub mod state_store;

pub use retention::{Identified, RetainedFeed, Upsert};
pub use state_store::{
    ANALYSIS_CAPACITY, Annotations, DETECTION_CAPACITY, EVENT_CAPACITY, INCIDENT_CAPACITY,
    LOG_CAPACITY, StateStore, StoreSummary, SystemStatus, synthesize_analysis,
};
