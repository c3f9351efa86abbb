use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::radio::{list_devices, RigModel};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteList {
    pub satellites: Vec<String>,
    /// Modification time of the local TLE file.
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated: Option<DateTime<Local>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceQuery {
    /// Substring device names must contain; defaults to `radio.device_filter`.
    pub filter: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RigInfo {
    pub name: String,
    pub hamlib_id: u32,
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    responses(
        (status = 200, description = "Satellites in the TLE catalog", body = SatelliteList),
        (status = 503, description = "Catalog unavailable", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn satellites(State(state): State<AppState>) -> ApiResult<Json<SatelliteList>> {
    let catalog = state.load_catalog().await?;
    Ok(Json(SatelliteList {
        satellites: catalog.names(),
        updated: state.catalog.modified(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/devices",
    params(DeviceQuery),
    responses(
        (status = 200, description = "Serial device names", body = Vec<String>),
        (status = 503, description = "Device directory unreadable", body = ErrorResponse)
    ),
    tag = "radio"
)]
pub async fn devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let radio = &state.config.radio;
    let filter = query.filter.unwrap_or_else(|| radio.device_filter.clone());
    let filter = (!filter.is_empty()).then_some(filter.as_str());
    list_devices(&radio.device_dir, filter)
        .map(Json)
        .map_err(|e| ApiError::Unavailable("devices_unavailable", e.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/rigs",
    responses(
        (status = 200, description = "Supported transceivers", body = Vec<RigInfo>)
    ),
    tag = "radio"
)]
pub async fn rigs() -> Json<Vec<RigInfo>> {
    Json(
        RigModel::ALL
            .iter()
            .map(|rig| RigInfo {
                name: rig.name().to_string(),
                hamlib_id: rig.hamlib_id(),
            })
            .collect(),
    )
}
