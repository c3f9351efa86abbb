pub(crate) mod doppler;
mod error;
mod session;
mod status;
#[cfg(test)]
pub(crate) mod testing;
mod tracker;
mod worker;

pub use doppler::DopplerFormula;
pub use error::TrackerError;
pub use session::{TrackingSession, DEFAULT_INTERVAL};
pub use status::{ConsoleSink, StatusSnapshot};
pub use tracker::{Tracker, TrackerMode, TrackerStatus};
