//! Background tasks that feed the store.
//!
//! The dispatcher applies broker events from the
//! [`EventBus`](crate::domain::EventBus) store feed; the sync task refreshes cameras,
//! events, health and incidents from the HTTP collaborator.

pub mod dispatcher;
pub mod sync;

pub use dispatcher::{run_dispatcher, spawn_dispatcher};
pub use sync::{
    refresh_all, refresh_cameras, refresh_events, refresh_incidents, refresh_system_status,
    spawn_sync,
};
