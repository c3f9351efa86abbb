use thiserror::Error;

use crate::predict::PredictError;
use crate::radio::RadioError;

#[derive(Debug, Error)]
pub enum DopplerError {
    #[error("invalid base frequency: {0}")]
    InvalidFrequency(f64),
    #[error("invalid geometry: degenerate line of sight")]
    InvalidGeometry,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker already running")]
    AlreadyRunning,
    #[error("no radio attached")]
    NoRadio,
    #[error("failed to open radio: {0}")]
    RadioOpenFailed(#[source] RadioError),
    #[error("radio error: {0}")]
    Radio(#[from] RadioError),
    #[error("doppler error: {0}")]
    Doppler(#[from] DopplerError),
    #[error("predict error: {0}")]
    Predict(#[from] PredictError),
    #[error("tracking worker failed: {0}")]
    Worker(String),
}
