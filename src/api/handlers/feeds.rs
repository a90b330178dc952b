//! Read-only views of the store: summary and newest-first feeds.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::PaginationParams;
use crate::app_state::AppState;

/// `GET /summary`: Camera and alert counts, feed sizes, broker flag.
pub async fn summary(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state.store.read().await.summary();
    (StatusCode::OK, Json(summary))
}

/// `GET /events`: Retained events, newest first.
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let page = params.paginate(state.store.read().await.events().iter());
    (StatusCode::OK, Json(page))
}

/// `GET /incidents`: Retained incidents, newest first.
pub async fn list_incidents(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let page = params.paginate(state.store.read().await.incidents().iter());
    (StatusCode::OK, Json(page))
}

/// `GET /detections`: Retained detections, newest first.
pub async fn list_detections(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let page = params.paginate(state.store.read().await.detections().iter());
    (StatusCode::OK, Json(page))
}

/// `GET /analyses`: Synthesized analyses, newest first.
pub async fn list_analyses(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let page = params.paginate(state.store.read().await.analyses().iter());
    (StatusCode::OK, Json(page))
}

/// `GET /logs`: Communication log, newest first.
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let page = params.paginate(state.store.read().await.logs().iter());
    (StatusCode::OK, Json(page))
}

/// Feed routes (mounted under `/api/v1`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/events", get(list_events))
        .route("/incidents", get(list_incidents))
        .route("/detections", get(list_detections))
        .route("/analyses", get(list_analyses))
        .route("/logs", get(list_logs))
}
