//! # vigil-console
//!
//! Event reconciliation and capture/publish core for a camera security
//! console.
//!
//! The console subscribes to a topic broker, decodes every inbound message
//! into a typed [`domain::BrokerEvent`], and folds it into a single
//! in-memory [`store::StateStore`] with bounded, newest-first feeds. Overlay
//! readings are smoothed per camera by the [`stability::StabilityTracker`].
//! A local capture loop renders frames with their annotations and publishes
//! throttled samples back to the broker.
//!
//! ## Architecture
//!
//! ```text
//! Topic broker (WebSocket)            HTTP collaborator (REST)
//!     │        ▲                              │
//!     │        │ camera/{id}/frame            │
//!     ▼        │                              ▼
//! BrokerClient (broker/) ◀── CaptureLoop   ApiClient (http_client/)
//!     │                       (capture/)      │
//!     ▼                          ▲            │
//! EventBus (domain/)             │ overlays   │
//!     │                          │            │
//!     ▼                          │            ▼
//! Dispatcher (service/) ──▶ StateStore (store/) ◀── Sync (service/)
//!                                │
//!                                ├── StabilityTracker (stability/)
//!                                ▼
//!                       Status API (api/, axum)
//! ```

pub mod api;
pub mod app_state;
pub mod broker;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod service;
pub mod stability;
pub mod store;
