mod error;
mod ground_station;
mod propagation;
mod types;

pub use error::PredictError;
pub use ground_station::GroundStation;
pub use propagation::{Ephemeris, Sgp4Ephemeris};
pub use types::{Observation, RelativeKinematics, SatelliteTrack};
