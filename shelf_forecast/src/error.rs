//! Error types for the shelf_forecast crate

use polars::prelude::PolarsError;
use shelf_math::MathError;
use thiserror::Error;

/// Custom error types for the shelf_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A required artifact (model or demand data) is not loaded
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Unknown product, or not enough history to forecast it
    #[error("Not found: {0}")]
    NotFound(String),

    /// Out-of-range horizon, limit or window parameter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// A model artifact is structurally invalid
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON decoding
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
