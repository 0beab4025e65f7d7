//! Trailing-window statistics
//!
//! Contains the statistics the forecaster recomputes on every recursive step:
//! - Arithmetic mean
//! - Population standard deviation
//! - Least-squares slope over the observation index

use crate::{MathError, Result};

/// Return the last `len` values of `values`
pub fn trailing(values: &[f64], len: usize) -> Result<&[f64]> {
    if len == 0 {
        return Err(MathError::InvalidInput(
            "Window length must be greater than zero".to_string(),
        ));
    }
    if values.len() < len {
        return Err(MathError::InsufficientData(format!(
            "Need {} values, have {}.",
            len,
            values.len()
        )));
    }

    Ok(&values[values.len() - len..])
}

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty window".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`)
pub fn population_std_dev(values: &[f64]) -> Result<f64> {
    let avg = mean(values)?;

    let variance: f64 = values
        .iter()
        .map(|&value| {
            let diff = value - avg;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;

    Ok(variance.sqrt())
}

/// Least-squares slope of `values` against their index (0, 1, 2, ...)
pub fn slope(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(
            "Need at least 2 points to fit a slope".to_string(),
        ));
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        numerator += (x - x_mean) * (y - y_mean);
        denominator += (x - x_mean) * (x - x_mean);
    }

    if denominator.abs() < 1e-10 {
        return Err(MathError::CalculationError(
            "Cannot calculate slope: x values are too similar".to_string(),
        ));
    }

    Ok(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trailing_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(trailing(&values, 2).unwrap(), &[4.0, 5.0]);
        assert!(matches!(
            trailing(&values, 6),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(trailing(&values, 0), Err(MathError::InvalidInput(_))));
    }

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(population_std_dev(&values).unwrap(), 2.0);
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn test_slope() {
        assert_relative_eq!(slope(&[1.0, 3.0, 5.0, 7.0]).unwrap(), 2.0);
        assert_relative_eq!(slope(&[4.0, 4.0, 4.0]).unwrap(), 0.0);
        assert!(slope(&[1.0]).is_err());
    }
}
