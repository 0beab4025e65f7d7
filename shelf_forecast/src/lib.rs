//! # Shelf Forecast
//!
//! Weekly demand history and multi-week demand forecasts for catalog products.
//!
//! ## Overview
//!
//! - [`InteractionLog`] reads the raw review log (CSV or JSON lines) through polars
//! - [`DemandSeriesStore`] buckets interactions into ISO weeks per product
//! - [`TrendRule`] classifies recent demand as increasing, decreasing or stable
//! - [`ForecastModel`] wraps the offline-trained regressor and its feature order
//! - [`Forecaster`] rolls the regressor forward one week at a time
//!
//! ## Example
//!
//! ```no_run
//! use shelf_forecast::{DemandSeriesStore, ForecastModel, ForecastSettings, Forecaster, InteractionLog};
//!
//! let log = InteractionLog::from_path("ml/dataset/reviews.jsonl")?;
//! let store = DemandSeriesStore::from_log(&log, 4);
//! let model = ForecastModel::load_from_dir("ml/models")?;
//!
//! let forecaster = Forecaster::new(&model, ForecastSettings::default());
//! let forecast = forecaster.forecast_product(&store, "B000123", 8)?;
//! println!("{:?}", forecast.forecast);
//! # Ok::<(), shelf_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod store;
pub mod trend;
pub mod week;

pub use data::{InteractionLog, InteractionRecord};
pub use error::{ForecastError, Result};
pub use features::{FeatureName, FeatureRow, DEFAULT_FEATURES, LOOKBACK_WEEKS};
pub use forecaster::{DemandForecast, ForecastPoint, ForecastSettings, Forecaster, HistoryShape, VariationPolicy};
pub use metrics::{backtest, check_holdout, mean_absolute_error, BacktestReport};
pub use models::{
    ForecastModel, GradientBoostingRegressor, LinearRegressor, ModelInfo, ModelMetrics, RegressionTree,
    Regressor, RegressorArtifact, TreeNode,
};
pub use store::{
    CategoryDemand, DemandPoint, DemandSeriesStore, DemandStats, ProductDemand, ProductSeries, TopProduct,
    WeekRange, WeeklyTotal, DEFAULT_MIN_FORECAST_WEEKS,
};
pub use trend::{classify_trend, Trend, TrendRule};
pub use week::WeekId;
