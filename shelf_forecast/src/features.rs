//! Feature reconstruction for the demand regressor
//!
//! The regressor was trained on lagged weekly demand plus calendar fields.
//! At forecast time the same features are rebuilt from the tail of the
//! working history, one step at a time.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use shelf_math::{mean, population_std_dev, trailing};
use std::fmt;

/// Weeks of history the lag and rolling features need
pub const LOOKBACK_WEEKS: usize = 4;

/// Name of one regressor input, as stored in the model info artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureName {
    #[serde(rename = "lag_1")]
    Lag1,
    #[serde(rename = "lag_2")]
    Lag2,
    #[serde(rename = "lag_4")]
    Lag4,
    #[serde(rename = "rolling_mean_4")]
    RollingMean4,
    #[serde(rename = "rolling_std_4")]
    RollingStd4,
    #[serde(rename = "week_of_year")]
    WeekOfYear,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "year")]
    Year,
}

impl FeatureName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::Lag1 => "lag_1",
            FeatureName::Lag2 => "lag_2",
            FeatureName::Lag4 => "lag_4",
            FeatureName::RollingMean4 => "rolling_mean_4",
            FeatureName::RollingStd4 => "rolling_std_4",
            FeatureName::WeekOfYear => "week_of_year",
            FeatureName::Month => "month",
            FeatureName::Year => "year",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature order used when the info artifact does not list one
pub const DEFAULT_FEATURES: [FeatureName; 5] = [
    FeatureName::Lag1,
    FeatureName::Lag2,
    FeatureName::Lag4,
    FeatureName::RollingMean4,
    FeatureName::RollingStd4,
];

/// Every feature the forecaster can produce for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub lag_1: f64,
    pub lag_2: f64,
    pub lag_4: f64,
    pub rolling_mean_4: f64,
    /// Population standard deviation of the last four weeks
    pub rolling_std_4: f64,
    pub week_of_year: f64,
    pub month: f64,
    pub year: f64,
}

impl FeatureRow {
    /// Build the features for the week starting on `target`
    ///
    /// `history` is the working series, oldest first, and must hold at least
    /// [`LOOKBACK_WEEKS`] values.
    pub fn from_history(history: &[f64], target: NaiveDate) -> Result<Self> {
        if history.len() < LOOKBACK_WEEKS {
            return Err(ForecastError::DataError(format!(
                "Need at least {} weeks of history for features, got {}",
                LOOKBACK_WEEKS,
                history.len()
            )));
        }

        let n = history.len();
        let window = trailing(history, LOOKBACK_WEEKS)?;

        Ok(Self {
            lag_1: history[n - 1],
            lag_2: history[n - 2],
            lag_4: history[n - 4],
            rolling_mean_4: mean(window)?,
            rolling_std_4: population_std_dev(window)?,
            week_of_year: target.iso_week().week() as f64,
            month: target.month() as f64,
            year: target.year() as f64,
        })
    }

    pub fn get(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::Lag1 => self.lag_1,
            FeatureName::Lag2 => self.lag_2,
            FeatureName::Lag4 => self.lag_4,
            FeatureName::RollingMean4 => self.rolling_mean_4,
            FeatureName::RollingStd4 => self.rolling_std_4,
            FeatureName::WeekOfYear => self.week_of_year,
            FeatureName::Month => self.month,
            FeatureName::Year => self.year,
        }
    }

    /// The values of `names`, in that order
    pub fn vector(&self, names: &[FeatureName]) -> Vec<f64> {
        names.iter().map(|&name| self.get(name)).collect()
    }
}
