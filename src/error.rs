//! Error taxonomy shared by the trajectory source, the engine and the exporters.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    /// Rejected before any cell is evaluated.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Aggregation cancelled before completion")]
    Cancelled,

    #[error("Unable to perform file operation: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GridError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        GridError::InvalidInput(msg.into())
    }
}

pub type Result<T, E = GridError> = std::result::Result<T, E>;
