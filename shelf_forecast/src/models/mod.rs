//! Demand regressors and the forecast model artifact
//!
//! The model is trained offline and shipped as two JSON files: the
//! regressor itself (`demand_forecast_model.json`) and its metadata
//! (`demand_forecast_info.json`) with the ordered feature names and the
//! training-time MAE.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureName, FeatureRow, DEFAULT_FEATURES};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub mod gradient_boosting;
pub mod linear;

pub use gradient_boosting::{GradientBoostingRegressor, RegressionTree, TreeNode};
pub use linear::LinearRegressor;

/// File name of the serialized regressor
pub const MODEL_FILE: &str = "demand_forecast_model.json";
/// File name of the model metadata
pub const INFO_FILE: &str = "demand_forecast_info.json";

/// A function from a fixed-width feature vector to a demand estimate
pub trait Regressor: Debug + Send + Sync {
    /// Human-readable model type
    fn name(&self) -> &str;

    /// Width of the feature vector the model expects
    fn n_features(&self) -> usize;

    /// Check the model parameters for structural errors
    fn validate(&self) -> Result<()>;

    /// Predict one value
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Reject feature vectors of the wrong width
    fn check_width(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.n_features() {
            return Err(ForecastError::InvalidArgument(format!(
                "Expected {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }
        Ok(())
    }
}

/// Serialized regressor, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    GradientBoosting(GradientBoostingRegressor),
    Linear(LinearRegressor),
}

impl RegressorArtifact {
    pub fn as_regressor(&self) -> &dyn Regressor {
        match self {
            RegressorArtifact::GradientBoosting(model) => model,
            RegressorArtifact::Linear(model) => model,
        }
    }
}

fn default_model_type() -> String {
    "GradientBoostingRegressor".to_string()
}

fn default_features() -> Vec<FeatureName> {
    DEFAULT_FEATURES.to_vec()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(rename = "MAE", default)]
    pub mae: Option<f64>,
}

/// Contents of the model info artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default = "default_features")]
    pub features: Vec<FeatureName>,
    #[serde(default)]
    pub metrics: ModelMetrics,
}

/// A validated regressor together with its feature order and metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastModel {
    regressor: RegressorArtifact,
    info: ModelInfo,
}

impl ForecastModel {
    /// Combine a regressor with its metadata
    ///
    /// Fails when the regressor is malformed or its width differs from the
    /// number of listed features.
    pub fn new(regressor: RegressorArtifact, info: ModelInfo) -> Result<Self> {
        let model = regressor.as_regressor();
        model.validate()?;

        if info.features.is_empty() {
            return Err(ForecastError::ValidationError(
                "Model info lists no features".to_string(),
            ));
        }
        if model.n_features() != info.features.len() {
            return Err(ForecastError::ValidationError(format!(
                "Regressor expects {} features but the info lists {}",
                model.n_features(),
                info.features.len()
            )));
        }

        Ok(Self { regressor, info })
    }

    /// Load both model files
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, info_path: Q) -> Result<Self> {
        let regressor: RegressorArtifact =
            serde_json::from_reader(BufReader::new(File::open(model_path.as_ref())?))?;
        let info: ModelInfo = serde_json::from_reader(BufReader::new(File::open(info_path.as_ref())?))?;

        let model = Self::new(regressor, info)?;
        info!(
            model_type = %model.model_type(),
            features = model.features().len(),
            mae = ?model.mae(),
            "loaded forecast model"
        );
        Ok(model)
    }

    /// Load `demand_forecast_model.json` and `demand_forecast_info.json` from a directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Self::load(dir.join(MODEL_FILE), dir.join(INFO_FILE))
    }

    /// Write both model files into a directory
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        serde_json::to_writer(File::create(dir.join(MODEL_FILE))?, &self.regressor)?;
        serde_json::to_writer_pretty(File::create(dir.join(INFO_FILE))?, &self.info)?;
        Ok(())
    }

    pub fn model_type(&self) -> &str {
        &self.info.model_type
    }

    pub fn features(&self) -> &[FeatureName] {
        &self.info.features
    }

    /// Training-time mean absolute error, if recorded
    pub fn mae(&self) -> Option<f64> {
        self.info.metrics.mae
    }

    pub fn regressor(&self) -> &dyn Regressor {
        self.regressor.as_regressor()
    }

    /// Predict demand for one feature row
    pub fn predict(&self, row: &FeatureRow) -> Result<f64> {
        let prediction = self.regressor().predict(&row.vector(self.features()))?;
        if !prediction.is_finite() {
            return Err(ForecastError::DataError(
                "Model produced a non-finite prediction".to_string(),
            ));
        }
        Ok(prediction)
    }
}
