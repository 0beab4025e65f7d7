#![allow(dead_code)]

use shelf_forecast::{
    FeatureName, ForecastModel, InteractionRecord, LinearRegressor, ModelInfo, ModelMetrics, RegressorArtifact,
};

/// 2023-01-02T00:00:00Z, the Monday of ISO week 2023-W01
pub const BASE_MS: i64 = 1_672_617_600_000;
pub const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const NOON_MS: i64 = 12 * 60 * 60 * 1000;

/// One interaction at noon on the Monday `week` weeks after the base week
pub fn record(product: &str, user: &str, week: i64, rating: Option<f64>) -> InteractionRecord {
    InteractionRecord::new(Some(user), product, BASE_MS + week * WEEK_MS + NOON_MS, rating)
}

/// `demands[i]` interactions in week `i`
pub fn series_records(product: &str, demands: &[u32]) -> Vec<InteractionRecord> {
    demands
        .iter()
        .enumerate()
        .flat_map(|(week, &count)| {
            (0..count).map(move |i| record(product, &format!("u{}", i), week as i64, Some(4.0)))
        })
        .collect()
}

/// A linear model over the given features
pub fn linear_model(features: Vec<FeatureName>, intercept: f64, coefficients: Vec<f64>) -> ForecastModel {
    let info = ModelInfo {
        model_type: "LinearRegression".to_string(),
        features,
        metrics: ModelMetrics { mae: Some(0.75) },
    };
    let regressor = RegressorArtifact::Linear(LinearRegressor::new(intercept, coefficients).unwrap());
    ForecastModel::new(regressor, info).unwrap()
}

/// Predicts last week's demand
pub fn persistence_model() -> ForecastModel {
    linear_model(vec![FeatureName::Lag1], 0.0, vec![1.0])
}
