use serde::Serialize;
use utoipa::ToSchema;

use super::error::PredictError;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

/// Lowest elevation accepted for a station, below the Dead Sea shore.
pub const MIN_ELEVATION_M: f64 = -500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub elevation_m: f64,
}

impl Default for GroundStation {
    fn default() -> Self {
        Self {
            latitude_deg: 47.165161521226466,
            longitude_deg: 8.295906232497849,
            elevation_m: 495.0,
        }
    }
}

impl GroundStation {
    pub fn new(
        latitude_deg: f64,
        longitude_deg: f64,
        elevation_m: f64,
    ) -> Result<Self, PredictError> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(PredictError::InvalidStation(format!(
                "latitude {} outside -90..90",
                latitude_deg
            )));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(PredictError::InvalidStation(format!(
                "longitude {} outside -180..180",
                longitude_deg
            )));
        }
        if !elevation_m.is_finite() || elevation_m < MIN_ELEVATION_M {
            return Err(PredictError::InvalidStation(format!(
                "elevation {} m below {} m",
                elevation_m, MIN_ELEVATION_M
            )));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            elevation_m,
        })
    }

    /// Parses `"lat, lon"` as written in the configuration file.
    pub fn from_coordinates(coordinates: &str, elevation_m: f64) -> Result<Self, PredictError> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return Err(PredictError::InvalidStation(format!(
                "expected \"lat, lon\", got \"{}\"",
                coordinates
            )));
        }
        let parse = |s: &str| {
            s.parse::<f64>()
                .map_err(|e| PredictError::InvalidStation(format!("{}: {}", s, e)))
        };
        Self::new(parse(parts[0])?, parse(parts[1])?, elevation_m)
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let (sin_lat, cos_lat) = self.lat_rad().sin_cos();
        let (sin_lon, cos_lon) = self.lon_rad().sin_cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.elevation_m / 1000.0;
        [
            (n + alt_km) * cos_lat * cos_lon,
            (n + alt_km) * cos_lat * sin_lon,
            (n * (1.0 - e2) + alt_km) * sin_lat,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinates() {
        let station = GroundStation::from_coordinates("47.1651, 8.2959", 495.0).unwrap();
        assert_eq!(station.latitude_deg, 47.1651);
        assert_eq!(station.longitude_deg, 8.2959);
        assert_eq!(station.elevation_m, 495.0);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(GroundStation::new(91.0, 0.0, 0.0).is_err());
        assert!(GroundStation::new(0.0, -180.5, 0.0).is_err());
        assert!(GroundStation::new(0.0, 0.0, -1000.0).is_err());
        assert!(GroundStation::from_coordinates("47.1", 0.0).is_err());
        assert!(GroundStation::from_coordinates("north, east", 0.0).is_err());
    }

    #[test]
    fn equator_on_prime_meridian() {
        let station = GroundStation::new(0.0, 0.0, 0.0).unwrap();
        let pos = station.position_ecef_km();
        assert!((pos[0] - 6378.137).abs() < 1e-9);
        assert!(pos[1].abs() < 1e-9);
        assert!(pos[2].abs() < 1e-9);
    }
}
