//! Camera handlers: list and per-camera overlays.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::CameraOverlaysResponse;
use crate::app_state::AppState;
use crate::capture::stability_badges;
use crate::domain::EntityId;
use crate::error::ConsoleError;

/// `GET /cameras`: Known cameras with their current status.
pub async fn list_cameras(State(state): State<AppState>) -> impl IntoResponse {
    let cameras = state.store.read().await.cameras().to_vec();
    (StatusCode::OK, Json(cameras))
}

/// `GET /cameras/{id}/overlays`: Latest overlays and smoothed readings.
///
/// # Errors
///
/// Returns [`ConsoleError::CameraNotFound`] if the id is neither a known
/// camera nor has ever reported overlays.
pub async fn camera_overlays(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ConsoleError> {
    let camera_id = EntityId::new(id);
    let store = state.store.read().await;
    let frame = store.overlays(&camera_id);
    if store.camera(&camera_id).is_none() && frame.is_none() {
        return Err(ConsoleError::CameraNotFound(camera_id.to_string()));
    }

    let timestamp = frame.and_then(|f| f.timestamp);
    let annotations = store.annotations(&camera_id);
    drop(store);

    let badges = stability_badges(&annotations.stability);
    let response = CameraOverlaysResponse {
        camera_id,
        overlays: annotations.overlays,
        timestamp,
        stability: annotations.stability,
        badges,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Camera routes (mounted under `/api/v1`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cameras", get(list_cameras))
        .route("/cameras/{id}/overlays", get(camera_overlays))
}
