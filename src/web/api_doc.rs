use utoipa::OpenApi;

use super::api::catalog::{RigInfo, SatelliteList};
use super::api::error::ErrorResponse;
use super::api::radio::SplitRequest;
use super::api::tracker::StartRequest;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::tracker::start,
        super::api::tracker::stop,
        super::api::tracker::status,
        super::api::radio::split,
        super::api::catalog::satellites,
        super::api::catalog::devices,
        super::api::catalog::rigs,
    ),
    components(
        schemas(
            StartRequest,
            SplitRequest,
            SatelliteList,
            RigInfo,
            ErrorResponse,
            crate::tracker::TrackerMode,
            crate::tracker::TrackerStatus,
            crate::tracker::StatusSnapshot,
        )
    ),
    info(
        title = "dplr-tracker API",
        description = "Doppler correction control for a rigctld-attached transceiver",
        version = "0.1.0"
    ),
    tags(
        (name = "tracker", description = "Tracking sessions"),
        (name = "radio", description = "Transceiver and serial devices"),
        (name = "catalog", description = "TLE catalog")
    )
)]
pub struct ApiDoc;
