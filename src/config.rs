//! Serving configuration
//!
//! The config file path is resolved in priority order:
//! 1. Command-line argument
//! 2. `SHELFCAST_CONFIG` environment variable
//! 3. `shelfcast.toml` in the working directory, if present
//! 4. Built-in defaults
//!
//! `SHELFCAST_ARTIFACT_DIR` and `SHELFCAST_REVIEWS_PATH` then override the
//! matching keys of whatever was loaded.

use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use shelf_forecast::{ForecastSettings, TrendRule};
use shelf_recommend::ArtifactPaths;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "SHELFCAST_CONFIG";
pub const ARTIFACT_DIR_ENV: &str = "SHELFCAST_ARTIFACT_DIR";
pub const REVIEWS_PATH_ENV: &str = "SHELFCAST_REVIEWS_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "shelfcast.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Collaborative weight used when a hybrid request does not give one
    pub default_cf_weight: f32,
    /// Upper bound on the result count of one request
    pub max_results: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_cf_weight: 0.6,
            max_results: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub max_horizon: usize,
    pub min_history_weeks: usize,
    pub display_history_weeks: usize,
    pub trend_window: usize,
    pub trend_threshold: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            max_horizon: 16,
            min_history_weeks: 4,
            display_history_weeks: 12,
            trend_window: 4,
            trend_threshold: 0.05,
        }
    }
}

/// Everything the serving context needs to start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Directory holding the recommendation and forecast artifacts
    pub artifact_dir: PathBuf,
    /// Raw interaction log the demand store is built from
    pub reviews_path: PathBuf,
    /// Build the demand store at startup instead of on first use
    pub eager_demand: bool,
    pub recommend: RecommendConfig,
    pub forecast: ForecastConfig,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("ml/models"),
            reviews_path: PathBuf::from("ml/dataset/reviews.jsonl"),
            eager_demand: false,
            recommend: RecommendConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl ServingConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServingConfig =
            toml::from_str(content).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Resolve, load and override the configuration from the process environment
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        Self::load_with(cli_path, |key| std::env::var(key).ok())
    }

    /// Same as [`ServingConfig::load`] with an explicit environment lookup
    pub fn load_with<F>(cli_path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_config_path(cli_path, &env) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(&env);
        Ok(config)
    }

    /// Apply the artifact-dir and reviews-path environment overrides
    pub fn apply_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env(ARTIFACT_DIR_ENV) {
            self.artifact_dir = PathBuf::from(dir);
        }
        if let Some(path) = env(REVIEWS_PATH_ENV) {
            self.reviews_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let weight = self.recommend.default_cf_weight;
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(ServiceError::Config(format!(
                "recommend.default_cf_weight must be in [0, 1], got {}",
                weight
            )));
        }
        if self.recommend.max_results == 0 {
            return Err(ServiceError::Config(
                "recommend.max_results must be at least 1".to_string(),
            ));
        }
        if self.forecast.max_horizon == 0 {
            return Err(ServiceError::Config(
                "forecast.max_horizon must be at least 1".to_string(),
            ));
        }
        self.trend_rule()?;
        Ok(())
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.artifact_dir)
    }

    pub fn forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            max_horizon: self.forecast.max_horizon,
            min_history_weeks: self.forecast.min_history_weeks,
            display_history_weeks: self.forecast.display_history_weeks,
        }
    }

    pub fn trend_rule(&self) -> Result<TrendRule> {
        TrendRule::new(self.forecast.trend_window, self.forecast.trend_threshold)
            .map_err(|e| ServiceError::Config(e.to_string()))
    }
}

/// Pick the config file: CLI argument, then environment, then the default file if it exists
fn resolve_config_path<F>(cli_path: Option<&Path>, env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }

    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}
