//! Linear regression over the feature vector

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegressor {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        let model = Self {
            intercept,
            coefficients,
        };
        model.validate()?;
        Ok(model)
    }
}

impl Regressor for LinearRegressor {
    fn name(&self) -> &str {
        "LinearRegression"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn validate(&self) -> Result<()> {
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::ValidationError(
                "Linear model parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        self.check_width(features)?;

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }
}
