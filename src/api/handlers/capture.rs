//! Capture control handlers: status, start, stop, publishing toggle.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::PublishingRequest;
use crate::app_state::AppState;
use crate::error::ConsoleError;

/// `GET /capture`: Current capture status.
///
/// # Errors
///
/// Returns [`ConsoleError::Capture`] when capture is not configured.
pub async fn capture_status(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ConsoleError> {
    let status = state.capture()?.status();
    Ok((StatusCode::OK, Json(status)))
}

/// `POST /capture/start`: Acquire the source and start streaming.
///
/// # Errors
///
/// Returns [`ConsoleError::Capture`] if capture is not configured, already
/// running, or the source cannot be acquired.
pub async fn start_capture(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ConsoleError> {
    let control = state.capture()?;
    control.start().await?;
    Ok((StatusCode::OK, Json(control.status())))
}

/// `POST /capture/stop`: Stop streaming and release the source.
///
/// # Errors
///
/// Returns [`ConsoleError::Capture`] when capture is not configured and
/// [`ConsoleError::Internal`] if the capture task is gone.
pub async fn stop_capture(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ConsoleError> {
    let control = state.capture()?;
    control.stop().await?;
    Ok((StatusCode::ACCEPTED, Json(control.status())))
}

/// `PUT /capture/publishing`: Turn frame publishing on or off.
///
/// # Errors
///
/// Returns [`ConsoleError::Capture`] when capture is not configured and
/// [`ConsoleError::Internal`] if the capture task is gone.
pub async fn set_publishing(
    State(state): State<AppState>,
    Json(req): Json<PublishingRequest>,
) -> Result<impl IntoResponse, ConsoleError> {
    state.capture()?.set_publishing(req.enabled).await?;
    Ok((StatusCode::ACCEPTED, Json(req)))
}

/// Capture routes (mounted under `/api/v1`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/capture", get(capture_status))
        .route("/capture/start", post(start_capture))
        .route("/capture/stop", post(stop_capture))
        .route("/capture/publishing", put(set_publishing))
}
