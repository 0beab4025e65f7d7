//! # Shelf Math
//!
//! Numerical helpers shared by the shelfcast crates.
//! This crate provides trailing-window statistics used to rebuild forecast
//! features and cosine similarity over sparse row vectors used by the
//! nearest-neighbour indexes.

use thiserror::Error;

pub mod similarity;
pub mod window;

pub use similarity::{cosine_similarity, SparseRow};
pub use window::{mean, population_std_dev, slope, trailing};

/// Errors that can occur in shelf math calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for shelf math operations
pub type Result<T> = std::result::Result<T, MathError>;
