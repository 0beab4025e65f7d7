//! Recursive multi-week demand forecasting
//!
//! Each step rebuilds the feature row from the working history, asks the
//! regressor for one week, and appends the answer before the next step.
//! Left alone, a lag-driven regressor fed its own output converges to a
//! fixed point within a few steps. [`VariationPolicy`] perturbs those
//! repeats with the product's historical volatility and slope.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureRow, LOOKBACK_WEEKS};
use crate::models::ForecastModel;
use crate::store::{DemandSeriesStore, ProductSeries};
use crate::week::WeekId;
use serde::Serialize;
use shelf_math::{population_std_dev, slope, trailing};
use tracing::debug;

/// Limits applied to every forecast request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    /// Largest accepted horizon in weeks
    pub max_horizon: usize,
    /// Weeks of history required before forecasting; never below the lookback
    pub min_history_weeks: usize,
    /// Number of trailing real weeks returned as history
    pub display_history_weeks: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            max_horizon: 16,
            min_history_weeks: LOOKBACK_WEEKS,
            display_history_weeks: 12,
        }
    }
}

impl ForecastSettings {
    /// Weeks of history a product needs
    pub fn required_history(&self) -> usize {
        self.min_history_weeks.max(LOOKBACK_WEEKS)
    }

    /// Reject horizons outside `1..=max_horizon`
    pub fn check_horizon(&self, horizon: usize) -> Result<()> {
        if horizon == 0 || horizon > self.max_horizon {
            return Err(ForecastError::InvalidArgument(format!(
                "Forecast horizon must be between 1 and {}, got {}",
                self.max_horizon, horizon
            )));
        }
        Ok(())
    }
}

/// Volatility and slope of the most recent real weeks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryShape {
    pub volatility: f64,
    /// Least-squares change per week
    pub slope: f64,
}

/// Heuristic that keeps recursive predictions from collapsing into a flat run
///
/// When a raw prediction lands within `min_step_change` of the previous one,
/// it is replaced by the rolling mean plus an alternating offset scaled by
/// the historical volatility, plus a slope term that grows with the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariationPolicy {
    /// Consecutive predictions closer than this count as a repeat
    pub min_step_change: f64,
    /// Real weeks used to measure volatility and slope
    pub shape_window: usize,
    /// Share of the historical standard deviation used as the offset
    pub volatility_fraction: f64,
    /// Smallest offset applied to a repeat
    pub min_variation: f64,
    /// Offset growth per step
    pub growth_per_step: f64,
    /// Share of the historical slope added per step
    pub trend_fraction: f64,
    /// Rolling std below this is treated as degenerate
    pub min_rolling_std: f64,
    /// Replacement floor for a degenerate rolling std
    pub rolling_std_floor: f64,
    /// Replacement for a degenerate rolling std as a share of the rolling mean
    pub rolling_std_fraction: f64,
}

impl Default for VariationPolicy {
    fn default() -> Self {
        Self {
            min_step_change: 0.15,
            shape_window: 8,
            volatility_fraction: 0.5,
            min_variation: 0.2,
            growth_per_step: 0.15,
            trend_fraction: 0.5,
            min_rolling_std: 0.05,
            rolling_std_floor: 0.1,
            rolling_std_fraction: 0.15,
        }
    }
}

impl VariationPolicy {
    /// A policy that leaves the regressor output untouched apart from clamping
    pub fn disabled() -> Self {
        Self {
            min_step_change: 0.0,
            min_rolling_std: 0.0,
            ..Self::default()
        }
    }

    /// Measure the tail of the real history
    pub fn history_shape(&self, history: &[f64]) -> HistoryShape {
        let window = trailing(history, self.shape_window.min(history.len()).max(1)).unwrap_or(history);

        HistoryShape {
            volatility: population_std_dev(window).unwrap_or(0.0),
            slope: slope(window).unwrap_or(0.0),
        }
    }

    /// Replace a near-zero rolling std so flat histories still carry spread
    pub fn condition_rolling_std(&self, rolling_std: f64, rolling_mean: f64) -> f64 {
        if rolling_std < self.min_rolling_std {
            (rolling_mean * self.rolling_std_fraction).max(self.rolling_std_floor)
        } else {
            rolling_std
        }
    }

    /// Final value for step `step` (zero-based), never negative
    pub fn adjust(
        &self,
        step: usize,
        raw: f64,
        previous: Option<f64>,
        rolling_mean: f64,
        shape: &HistoryShape,
    ) -> f64 {
        let repeats = previous
            .map(|last| (raw - last).abs() < self.min_step_change)
            .unwrap_or(false);
        if !repeats {
            return raw.max(0.0);
        }

        let direction = if step % 2 == 0 { 1.0 } else { -1.0 };
        let magnitude = (shape.volatility * self.volatility_fraction).max(self.min_variation);
        let variation = magnitude * direction * (1.0 + step as f64 * self.growth_per_step);
        let trend = shape.slope * (step + 1) as f64 * self.trend_fraction;

        (rolling_mean + variation + trend).max(0.0)
    }
}

/// One point of a forecast response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// ISO week for history, `Forecast-k` for predicted steps
    pub week: String,
    pub demand: f64,
    pub is_forecast: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandForecast {
    pub product_id: String,
    pub model_type: String,
    pub model_mae: Option<f64>,
    pub forecast_weeks: usize,
    pub historical: Vec<ForecastPoint>,
    pub forecast: Vec<ForecastPoint>,
    /// `historical` followed by `forecast`
    pub combined: Vec<ForecastPoint>,
}

/// Stateless forecaster over a loaded model
#[derive(Debug, Clone)]
pub struct Forecaster<'a> {
    model: &'a ForecastModel,
    settings: ForecastSettings,
    policy: VariationPolicy,
}

impl<'a> Forecaster<'a> {
    pub fn new(model: &'a ForecastModel, settings: ForecastSettings) -> Self {
        Self {
            model,
            settings,
            policy: VariationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: VariationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &ForecastModel {
        self.model
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn policy(&self) -> &VariationPolicy {
        &self.policy
    }

    /// Forecast a product held in the demand store
    pub fn forecast_product(
        &self,
        store: &DemandSeriesStore,
        product_id: &str,
        horizon: usize,
    ) -> Result<DemandForecast> {
        self.settings.check_horizon(horizon)?;
        let series = store
            .series(product_id)
            .ok_or_else(|| ForecastError::NotFound(format!("No demand history for product {}", product_id)))?;
        self.forecast(series, horizon)
    }

    /// Forecast `horizon` weeks past the end of `series`
    pub fn forecast(&self, series: &ProductSeries, horizon: usize) -> Result<DemandForecast> {
        self.settings.check_horizon(horizon)?;

        let required = self.settings.required_history();
        let last_week = match series.last_week() {
            Some(week) if series.len() >= required => week,
            _ => {
                return Err(ForecastError::NotFound(format!(
                    "Product {} has {} weeks of history, need at least {}",
                    series.product_id(),
                    series.len(),
                    required
                )))
            }
        };

        let values = self.forecast_values(&series.demands(), last_week, horizon)?;

        let points = series.points();
        let shown = points.len().min(self.settings.display_history_weeks);
        let historical: Vec<ForecastPoint> = points[points.len() - shown..]
            .iter()
            .map(|p| ForecastPoint {
                week: p.week.to_string(),
                demand: p.demand as f64,
                is_forecast: false,
            })
            .collect();
        let forecast: Vec<ForecastPoint> = values
            .into_iter()
            .enumerate()
            .map(|(i, demand)| ForecastPoint {
                week: format!("Forecast-{}", i + 1),
                demand,
                is_forecast: true,
            })
            .collect();
        let combined = historical.iter().chain(forecast.iter()).cloned().collect();

        debug!(product_id = series.product_id(), horizon, "forecast complete");

        Ok(DemandForecast {
            product_id: series.product_id().to_string(),
            model_type: self.model.model_type().to_string(),
            model_mae: self.model.mae(),
            forecast_weeks: horizon,
            historical,
            forecast,
            combined,
        })
    }

    /// Core recursion: `horizon` predictions following `history`
    ///
    /// `last_week` is the calendar week of the final history value; step `k`
    /// uses the calendar features of `last_week + k`.
    pub fn forecast_values(&self, history: &[f64], last_week: WeekId, horizon: usize) -> Result<Vec<f64>> {
        if history.len() < LOOKBACK_WEEKS {
            return Err(ForecastError::NotFound(format!(
                "Need at least {} weeks of history, got {}",
                LOOKBACK_WEEKS,
                history.len()
            )));
        }

        let shape = self.policy.history_shape(history);
        let mut working = history.to_vec();
        let mut predictions = Vec::with_capacity(horizon);

        for step in 0..horizon {
            let target = last_week.plus_weeks(step as i64 + 1);
            let mut row = FeatureRow::from_history(&working, target.monday())?;
            row.rolling_std_4 = self
                .policy
                .condition_rolling_std(row.rolling_std_4, row.rolling_mean_4);

            let raw = self.model.predict(&row)?;
            let value = self
                .policy
                .adjust(step, raw, predictions.last().copied(), row.rolling_mean_4, &shape);

            working.push(value);
            predictions.push(value);
        }

        Ok(predictions)
    }
}
