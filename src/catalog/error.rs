use thiserror::Error;

use crate::predict::PredictError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Satellite not found: {0}")]
    NotFound(String),
    #[error("Malformed record for {0}: expected two element lines")]
    Malformed(String),
    #[error("Invalid elements: {0}")]
    Elements(#[from] PredictError),
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Satellite catalog unavailable: {0}")]
    Unavailable(String),
}
