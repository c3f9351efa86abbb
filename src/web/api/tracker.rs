use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::tracker::{TrackerMode, TrackerStatus};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartRequest {
    /// Name as listed in the TLE catalog.
    pub satellite: String,
    /// Overrides `tracking.listen_only` from the configuration.
    #[serde(default)]
    pub listen_only: Option<bool>,
}

#[utoipa::path(
    post,
    path = "/api/tracker/start",
    request_body = StartRequest,
    responses(
        (status = 200, description = "Tracker started", body = TrackerMode),
        (status = 400, description = "Invalid configuration or elements", body = ErrorResponse),
        (status = 404, description = "Satellite not in catalog", body = ErrorResponse),
        (status = 409, description = "Tracker already running", body = ErrorResponse),
        (status = 502, description = "Radio could not be opened", body = ErrorResponse),
        (status = 503, description = "Catalog or radio unavailable", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<TrackerMode>> {
    let catalog = state.load_catalog().await?;
    let satellite = catalog.resolve(&request.satellite)?;
    let session = state.config.session(satellite, request.listen_only, None)?;

    let mut tracker = state.tracker.lock().await;
    tracker.start(session, Vec::new()).await?;
    Ok(Json(tracker.mode().clone()))
}

#[utoipa::path(
    post,
    path = "/api/tracker/stop",
    responses(
        (status = 200, description = "Tracker stopped", body = TrackerMode),
        (status = 500, description = "Worker failed", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn stop(State(state): State<AppState>) -> ApiResult<Json<TrackerMode>> {
    let mut tracker = state.tracker.lock().await;
    tracker.stop().await?;
    Ok(Json(tracker.mode().clone()))
}

#[utoipa::path(
    get,
    path = "/api/tracker/status",
    responses(
        (status = 200, description = "Tracker mode and latest snapshot", body = TrackerStatus)
    ),
    tag = "tracker"
)]
pub async fn status(State(state): State<AppState>) -> Json<TrackerStatus> {
    let tracker = state.tracker.lock().await;
    Json(tracker.status())
}
