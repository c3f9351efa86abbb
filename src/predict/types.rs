use chrono::{DateTime, Utc};
use serde::Serialize;
use sgp4::{Constants, Elements};
use utoipa::ToSchema;

use super::error::PredictError;

/// A satellite resolved from the catalog, ready to be propagated.
pub struct SatelliteTrack {
    name: String,
    pub(crate) elements: Elements,
    pub(crate) constants: Constants,
}

impl SatelliteTrack {
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self, PredictError> {
        let invalid = |message: String| PredictError::InvalidTle {
            name: name.to_string(),
            message,
        };
        let elements = Elements::from_tle(
            Some(name.to_string()),
            line1.as_bytes(),
            line2.as_bytes(),
        )
        .map_err(|e| invalid(e.to_string()))?;
        let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            elements,
            constants,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }
}

impl std::fmt::Debug for SatelliteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SatelliteTrack")
            .field("name", &self.name)
            .field("norad_id", &self.elements.norad_id)
            .finish()
    }
}

/// Raw geometry between station and satellite at one instant.
///
/// Vectors are satellite minus station, in an Earth-fixed frame.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub relative_position_km: [f64; 3],
    pub relative_velocity_km_s: [f64; 3],
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RelativeKinematics {
    pub timestamp: DateTime<Utc>,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
    pub radial_velocity_km_s: f64,
}
