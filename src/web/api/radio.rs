use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::config::check_split_frequency;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SplitRequest {
    /// Defaults to `tracking.split_frequency_hz`.
    #[serde(default)]
    pub frequency_hz: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/radio/split",
    request_body = SplitRequest,
    responses(
        (status = 204, description = "Split enabled or queued to the running tracker"),
        (status = 400, description = "Frequency out of range", body = ErrorResponse),
        (status = 502, description = "Radio rejected the command", body = ErrorResponse),
        (status = 503, description = "No radio attached", body = ErrorResponse)
    ),
    tag = "radio"
)]
pub async fn split(
    State(state): State<AppState>,
    Json(request): Json<SplitRequest>,
) -> ApiResult<StatusCode> {
    let tracking = &state.config.tracking;
    let frequency_hz =
        check_split_frequency(request.frequency_hz.unwrap_or(tracking.split_frequency_hz))?;

    let mut tracker = state.tracker.lock().await;
    tracker.set_split(tracking.split_vfo, frequency_hz).await?;
    Ok(StatusCode::NO_CONTENT)
}
