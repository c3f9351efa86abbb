use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid station: {0}")]
    InvalidStation(String),
    #[error("Invalid TLE for {name}: {message}")]
    InvalidTle { name: String, message: String },
    #[error("Propagation error: {0}")]
    Propagation(String),
}
