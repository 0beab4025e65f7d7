//! Errors surfaced by the serving layer

use shelf_forecast::ForecastError;
use shelf_recommend::RecommendError;
use thiserror::Error;

/// The conditions a caller of [`crate::ServingContext`] can observe
///
/// `NotReady`, `NotFound` and `InvalidArgument` are kept distinct so a
/// request layer can map them to different status codes.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A capability is unavailable because its artifact failed to load
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Unknown product, or not enough history to forecast it
    #[error("Not found: {0}")]
    NotFound(String),

    /// Out-of-range request parameter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Offline artifact generation failed
    #[error("Build error: {0}")]
    Build(String),

    /// Unexpected failure while serving a request
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl From<RecommendError> for ServiceError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::NotReady(msg) => ServiceError::NotReady(msg),
            RecommendError::NotFound(msg) => ServiceError::NotFound(msg),
            RecommendError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
            other => ServiceError::NotReady(other.to_string()),
        }
    }
}

impl From<ForecastError> for ServiceError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::NotReady(msg) => ServiceError::NotReady(msg),
            ForecastError::NotFound(msg) => ServiceError::NotFound(msg),
            ForecastError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
            e @ (ForecastError::IoError(_) | ForecastError::JsonError(_) | ForecastError::PolarsError(_)) => {
                ServiceError::NotReady(e.to_string())
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}
