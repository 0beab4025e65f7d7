//! Error types for the shelf_recommend crate

use thiserror::Error;

/// Custom error types for the shelf_recommend crate
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The artifact backing this capability failed to load
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Identifier unknown to the relevant index or metadata table
    #[error("Not found: {0}")]
    NotFound(String),

    /// Out-of-range result count or blend weight
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Artifact content is structurally inconsistent
    #[error("Artifact error: {0}")]
    ArtifactError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON decoding or encoding
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RecommendError {
    /// Whether the hybrid blender may recover from this error by using the other source
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, RecommendError::NotReady(_) | RecommendError::NotFound(_))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, RecommendError>;
