use chrono::{DateTime, Utc};

use super::error::PredictError;
use super::ground_station::{GroundStation, EARTH_ROTATION_RAD_S};
use super::types::{Observation, SatelliteTrack};

/// Source of station-relative satellite geometry.
pub trait Ephemeris: Send + Sync {
    fn observe(
        &self,
        satellite: &SatelliteTrack,
        station: &GroundStation,
        timestamp: DateTime<Utc>,
    ) -> Result<Observation, PredictError>;
}

/// SGP4 propagation, rotated from TEME into an Earth-fixed frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sgp4Ephemeris;

impl Ephemeris for Sgp4Ephemeris {
    fn observe(
        &self,
        satellite: &SatelliteTrack,
        station: &GroundStation,
        timestamp: DateTime<Utc>,
    ) -> Result<Observation, PredictError> {
        let minutes = satellite
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let prediction = satellite
            .constants
            .propagate(minutes)
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &timestamp.naive_utc(),
        ));

        let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
        let sat_vel_ecef =
            teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);

        // the station is at rest in the Earth-fixed frame
        let sta_ecef = station.position_ecef_km();

        let dr = [
            sat_ecef[0] - sta_ecef[0],
            sat_ecef[1] - sta_ecef[1],
            sat_ecef[2] - sta_ecef[2],
        ];
        let dv = sat_vel_ecef;
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let (east, north, up) = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
        let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation_deg = if range_km > 0.0 {
            (up / range_km).asin().to_degrees()
        } else {
            0.0
        };

        Ok(Observation {
            timestamp,
            relative_position_km: dr,
            relative_velocity_km_s: dv,
            elevation_deg,
            azimuth_deg,
            range_km,
        })
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    // remove the frame rotation: v_ecef = R v_teme - w x r_ecef
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::fixtures;
    use crate::tracker::doppler::radial_velocity;
    use chrono::TimeZone;

    #[test]
    fn enu_axes() {
        // station on the equator at lon 0: x is up, y is east, z is north
        let (e, n, u) = ecef_to_enu([1.0, 0.0, 0.0], 0.0, 0.0);
        assert!((u - 1.0).abs() < 1e-12 && e.abs() < 1e-12 && n.abs() < 1e-12);
        let (e, n, u) = ecef_to_enu([0.0, 1.0, 0.0], 0.0, 0.0);
        assert!((e - 1.0).abs() < 1e-12 && n.abs() < 1e-12 && u.abs() < 1e-12);
        let (e, n, u) = ecef_to_enu([0.0, 0.0, 1.0], 0.0, 0.0);
        assert!((n - 1.0).abs() < 1e-12 && e.abs() < 1e-12 && u.abs() < 1e-12);
    }

    #[test]
    fn iss_geometry_is_plausible() {
        let satellite = fixtures::iss();
        let station = GroundStation::default();
        let at = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap();

        let obs = Sgp4Ephemeris.observe(&satellite, &station, at).unwrap();

        // LEO: never closer than its altitude, never beyond the far side of Earth
        assert!(obs.range_km > 350.0 && obs.range_km < 13_500.0, "{}", obs.range_km);
        assert!((-90.0..=90.0).contains(&obs.elevation_deg));
        assert!((0.0..360.0).contains(&obs.azimuth_deg));

        let v = radial_velocity(obs.relative_position_km, obs.relative_velocity_km_s).unwrap();
        assert!(v.abs() < 8.5, "radial velocity {v} km/s");
    }

    #[test]
    fn range_rate_matches_finite_difference() {
        let satellite = fixtures::iss();
        let station = GroundStation::default();
        let at = Utc.with_ymd_and_hms(2020, 7, 13, 6, 30, 0).unwrap();
        let half = chrono::Duration::milliseconds(500);

        let now = Sgp4Ephemeris.observe(&satellite, &station, at).unwrap();
        let before = Sgp4Ephemeris.observe(&satellite, &station, at - half).unwrap();
        let after = Sgp4Ephemeris.observe(&satellite, &station, at + half).unwrap();

        let projected =
            radial_velocity(now.relative_position_km, now.relative_velocity_km_s).unwrap();
        let differenced = after.range_km - before.range_km;
        assert!(
            (projected - differenced).abs() < 0.01,
            "projected {projected}, differenced {differenced}"
        );
    }
}
