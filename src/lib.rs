//! # Shelfcast
//!
//! Serving core for an e-commerce catalog: item-to-item recommendations
//! (collaborative, content-based and hybrid) and weekly demand forecasts,
//! all computed in memory from pre-built artifacts.
//!
//! The heavy lifting lives in the workspace crates:
//! - `shelf_recommend` for the similarity indexes, blending and catalog
//! - `shelf_forecast` for the demand store, trend rule and forecaster
//! - `shelf_math` for the shared numerical helpers
//!
//! This crate ties them together behind [`ServingContext`], configured by
//! [`ServingConfig`].
//!
//! ```no_run
//! use shelfcast::{Method, ServingConfig, ServingContext};
//!
//! let context = ServingContext::load(ServingConfig::load(None)?)?;
//! let similar = context.recommend(Method::Hybrid, "B000123", 6, None)?;
//! let forecast = context.forecast("B000123", 8)?;
//! # Ok::<(), shelfcast::ServiceError>(())
//! ```

pub mod build;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;

pub use build::{build_artifacts, BuildOptions, BuildSummary};
pub use config::{ForecastConfig, RecommendConfig, ServingConfig};
pub use context::{DemandLoader, ServiceStats, ServingContext, DEFAULT_CATEGORY_LIMIT, MAX_TOP_LIMIT};
pub use error::{Result, ServiceError};
pub use logging::init_logging;

// Re-export the request and response types of the member crates
pub use shelf_forecast::{
    BacktestReport, CategoryDemand, DemandForecast, DemandStats, ForecastPoint, ProductDemand, TopProduct, Trend,
    WeeklyTotal,
};
pub use shelf_recommend::{Method, Product, ProductPage, Recommendation, RecommendationStats};
