use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::DopplerError;

pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// How the received frequency is derived from the radial velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DopplerFormula {
    /// First order: `f * (1 - v / c)`.
    #[default]
    Linear,
    /// `f * c / (c - v)`, the scaling used by some earlier revisions of the tool.
    /// With the receding-positive sign convention this raises the frequency
    /// of a receding satellite.
    Ratio,
}

impl DopplerFormula {
    /// Frequency observed on the ground for a signal emitted at `base_hz` by a
    /// satellite moving with `radial_velocity_km_s` (positive when receding).
    pub fn shifted_frequency(
        &self,
        base_hz: f64,
        radial_velocity_km_s: f64,
    ) -> Result<f64, DopplerError> {
        if !base_hz.is_finite() || base_hz <= 0.0 {
            return Err(DopplerError::InvalidFrequency(base_hz));
        }
        if !radial_velocity_km_s.is_finite() {
            return Err(DopplerError::InvalidGeometry);
        }

        let shifted = match self {
            DopplerFormula::Linear => {
                base_hz * (1.0 - radial_velocity_km_s / SPEED_OF_LIGHT_KM_S)
            }
            DopplerFormula::Ratio => {
                base_hz * SPEED_OF_LIGHT_KM_S / (SPEED_OF_LIGHT_KM_S - radial_velocity_km_s)
            }
        };
        Ok(shifted)
    }

    /// Frequency to transmit so that the satellite hears `base_hz`.
    pub fn precompensated_frequency(
        &self,
        base_hz: f64,
        radial_velocity_km_s: f64,
    ) -> Result<f64, DopplerError> {
        self.shifted_frequency(base_hz, -radial_velocity_km_s)
    }
}

/// Scalar projection of the relative velocity onto the line of sight.
///
/// `position_km` and `velocity_km_s` are satellite minus station, in the same
/// frame. The result is positive while the range is increasing.
pub fn radial_velocity(
    position_km: [f64; 3],
    velocity_km_s: [f64; 3],
) -> Result<f64, DopplerError> {
    if position_km
        .iter()
        .chain(velocity_km_s.iter())
        .any(|c| !c.is_finite())
    {
        return Err(DopplerError::InvalidGeometry);
    }

    let range = norm(position_km);
    if range == 0.0 {
        return Err(DopplerError::InvalidGeometry);
    }

    Ok(dot(position_km, velocity_km_s) / range)
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
