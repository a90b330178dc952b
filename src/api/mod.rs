//! Status API: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. Everything is read-only except the capture controls.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tokio::sync::{RwLock, watch};
    use tower::ServiceExt;

    use super::*;
    use crate::broker::ConnectionState;
    use crate::capture::capture_loop::tests::{FakeSink, FakeSource, RecordingPublisher};
    use crate::capture::{CaptureControl, CaptureLoop, CaptureSettings, spawn_capture};
    use crate::domain::{
        BoundingBox, BrokerEvent, Camera, CameraStatus, Event, Overlay, OverlayFrame, Severity,
    };
    use crate::store::StateStore;

    fn state(store: StateStore, capture: Option<CaptureControl>) -> AppState {
        let (_, broker_state) = watch::channel(ConnectionState::Connected);
        AppState {
            store: Arc::new(RwLock::new(store)),
            broker_state,
            capture,
        }
    }

    fn capture_control() -> CaptureControl {
        let capture = CaptureLoop::new(
            FakeSource::default(),
            FakeSink::default(),
            Arc::new(RecordingPublisher::default()),
            &CaptureSettings {
                camera_id: "webcam-local".to_string(),
                render_interval: Duration::from_millis(10),
                publish_interval: Duration::from_millis(300),
                publish_enabled: false,
            },
        );
        let (control, _task) = spawn_capture(capture, Arc::new(RwLock::new(StateStore::new())));
        control
    }

    async fn call(state: AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
        let Ok(request) = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
        else {
            panic!("request must build");
        };
        let Ok(response) = build_router().with_state(state).oneshot(request).await else {
            panic!("router must answer");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body must be readable");
        };
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn seeded_store() -> StateStore {
        let mut store = StateStore::new();
        store.set_cameras(vec![
            Camera::new("cam-1", "Front door").with_status(CameraStatus::Online),
            Camera::new("cam-2", "Garage").with_status(CameraStatus::Offline),
        ]);
        store.apply(BrokerEvent::Connected);
        for id in 1..=25_u64 {
            store.apply(BrokerEvent::EventNew(Event::new(id, Severity::Low)));
        }
        store.apply(BrokerEvent::Overlays(OverlayFrame {
            camera_id: "cam-1".into(),
            overlays: vec![
                Overlay::new("front door", BoundingBox::new(0.0, 0.0, 10.0, 10.0))
                    .with_status("open"),
            ],
            timestamp: None,
        }));
        store
    }

    #[tokio::test]
    async fn health_reports_broker_state() {
        let (status, body) = call(state(StateStore::new(), None), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("status"), Some(&json!("healthy")));
        assert_eq!(body.get("broker"), Some(&json!("connected")));
    }

    #[tokio::test]
    async fn summary_counts_cameras_and_feeds() {
        let (status, body) =
            call(state(seeded_store(), None), Method::GET, "/api/v1/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("cameras"), Some(&json!(2)));
        assert_eq!(body.get("online"), Some(&json!(1)));
        assert_eq!(body.get("events"), Some(&json!(25)));
        assert_eq!(body.get("brokerConnected"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn events_are_paginated_newest_first() {
        let (status, body) = call(
            state(seeded_store(), None),
            Method::GET,
            "/api/v1/events?page=2&per_page=20",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|e| e.get("id")?.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec!["5", "4", "3", "2", "1"]);
        assert_eq!(
            body.pointer("/pagination/total_pages"),
            Some(&json!(2))
        );
    }

    #[tokio::test]
    async fn logs_and_analyses_are_exposed() {
        let app_state = state(seeded_store(), None);
        let (_, logs) = call(app_state.clone(), Method::GET, "/api/v1/logs", None).await;
        assert_eq!(logs.pointer("/pagination/total"), Some(&json!(27)));
        let (_, analyses) = call(app_state, Method::GET, "/api/v1/analyses", None).await;
        assert_eq!(analyses.pointer("/pagination/total"), Some(&json!(25)));
    }

    #[tokio::test]
    async fn overlays_include_stability_badges() {
        let (status, body) = call(
            state(seeded_store(), None),
            Method::GET,
            "/api/v1/cameras/cam-1/overlays",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.pointer("/badges/0"), Some(&json!("Door: open (stable 1/30)")));
        assert_eq!(body.pointer("/overlays/0/label"), Some(&json!("front door")));
    }

    #[tokio::test]
    async fn unknown_camera_is_not_found() {
        let (status, body) = call(
            state(seeded_store(), None),
            Method::GET,
            "/api/v1/cameras/cam-9/overlays",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.pointer("/error/code"), Some(&json!(2001)));
    }

    #[tokio::test]
    async fn capture_without_source_is_unavailable() {
        let (status, _) = call(
            state(StateStore::new(), None),
            Method::POST,
            "/api/v1/capture/start",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn capture_start_then_double_start_conflicts() {
        let app_state = state(StateStore::new(), Some(capture_control()));

        let (status, body) =
            call(app_state.clone(), Method::POST, "/api/v1/capture/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("state"), Some(&json!("streaming")));

        let (status, body) =
            call(app_state.clone(), Method::POST, "/api/v1/capture/start", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.pointer("/error/code"), Some(&json!(4001)));

        let (status, _) = call(app_state, Method::POST, "/api/v1/capture/stop", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn publishing_toggle_accepts_json() {
        let app_state = state(StateStore::new(), Some(capture_control()));
        let (status, body) = call(
            app_state,
            Method::PUT,
            "/api/v1/capture/publishing",
            Some(json!({"enabled": true})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.get("enabled"), Some(&json!(true)));
    }
}
