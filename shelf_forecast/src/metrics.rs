//! Forecast accuracy metrics

use crate::error::{ForecastError, Result};
use crate::forecaster::Forecaster;
use crate::store::ProductSeries;
use serde::Serialize;

/// Mean absolute error between two aligned, non-empty sequences
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(ForecastError::InvalidArgument(
            "Predicted and actual values must have the same non-zero length".to_string(),
        ));
    }

    let total: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum();
    Ok(total / predicted.len() as f64)
}

/// Outcome of forecasting held-out weeks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub product_id: String,
    pub holdout_weeks: usize,
    pub mae: f64,
    pub predicted: Vec<f64>,
    pub actual: Vec<f64>,
}

/// Reject an empty holdout
pub fn check_holdout(holdout: usize) -> Result<()> {
    if holdout == 0 {
        return Err(ForecastError::InvalidArgument(
            "Holdout must be at least one week".to_string(),
        ));
    }
    Ok(())
}

/// Hold out the last `holdout` weeks, forecast them from the rest and score them
pub fn backtest(forecaster: &Forecaster<'_>, series: &ProductSeries, holdout: usize) -> Result<BacktestReport> {
    check_holdout(holdout)?;

    let required = forecaster.settings().required_history();
    if series.len() < holdout + required {
        return Err(ForecastError::NotFound(format!(
            "Product {} has {} weeks; backtesting {} weeks needs {}",
            series.product_id(),
            series.len(),
            holdout,
            holdout + required
        )));
    }

    let train = series.head(series.len() - holdout);
    let last_week = train.last_week().ok_or_else(|| {
        ForecastError::DataError(format!("Empty training series for {}", series.product_id()))
    })?;

    let predicted = forecaster.forecast_values(&train.demands(), last_week, holdout)?;
    let actual: Vec<f64> = series.demands().split_off(train.len());
    let mae = mean_absolute_error(&predicted, &actual)?;

    Ok(BacktestReport {
        product_id: series.product_id().to_string(),
        holdout_weeks: holdout,
        mae,
        predicted,
        actual,
    })
}
