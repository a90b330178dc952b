//! HTTP collaborator client.
//!
//! [`ApiClient`] fetches the camera list, recent events, backend health and
//! incidents over REST. The sync tasks in [`crate::service`] apply the
//! results to the store.

pub mod client;
pub mod models;

pub use client::ApiClient;
pub use models::{ApiCamera, ApiEvent, ApiHealth};
