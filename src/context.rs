//! Process-wide serving state
//!
//! [`ServingContext`] is built once at startup and shared by reference (or
//! `Arc`) between request handlers. Nothing in it is mutated after
//! construction except the demand store, which is built at most once on
//! first use unless `eager_demand` is set.

use crate::config::ServingConfig;
use crate::error::{Result, ServiceError};
use once_cell::sync::OnceCell;
use serde::Serialize;
use shelf_forecast::{
    backtest, check_holdout, BacktestReport, CategoryDemand, DemandForecast, DemandSeriesStore, DemandStats, ForecastModel,
    ForecastSettings, Forecaster, InteractionLog, ProductDemand, TopProduct, TrendRule, WeeklyTotal,
};
use shelf_recommend::{
    Method, Product, ProductPage, Recommendation, RecommendationEngine, RecommendationStats,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest accepted limit for ranked demand listings
pub const MAX_TOP_LIMIT: usize = 100;
/// Category listing size when the caller does not choose one
pub const DEFAULT_CATEGORY_LIMIT: usize = 15;

/// Builds the demand store on first use
pub type DemandLoader = Box<dyn Fn() -> shelf_forecast::Result<DemandSeriesStore> + Send + Sync>;

/// Health summary across both capabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    #[serde(flatten)]
    pub recommendation: RecommendationStats,
    pub forecast_model_loaded: bool,
    /// `None` until the demand store has been requested
    pub demand_data_loaded: Option<bool>,
}

/// Immutable artifacts plus the lazily built demand store
pub struct ServingContext {
    config: ServingConfig,
    engine: RecommendationEngine,
    model: Option<ForecastModel>,
    trend_rule: TrendRule,
    forecast_settings: ForecastSettings,
    demand_loader: DemandLoader,
    demand: OnceCell<Option<Arc<DemandSeriesStore>>>,
}

impl ServingContext {
    /// Load every artifact named by `config`
    ///
    /// Individual failures only disable the capability they back.
    pub fn load(config: ServingConfig) -> Result<Self> {
        let engine = RecommendationEngine::load(&config.artifact_paths(), config.recommend.max_results);

        let model = match ForecastModel::load_from_dir(&config.artifact_dir) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!("Could not load forecast model from {:?}: {}", config.artifact_dir, e);
                None
            }
        };

        let reviews_path = config.reviews_path.clone();
        let min_weeks = config.forecast_settings().required_history();
        let loader: DemandLoader = Box::new(move || -> shelf_forecast::Result<DemandSeriesStore> {
            let log = InteractionLog::from_path(&reviews_path)?;
            Ok(DemandSeriesStore::from_log(&log, min_weeks))
        });

        let context = Self::from_parts(config, engine, model, loader)?;
        if context.config.eager_demand {
            // A failure is cached and reported as not ready on every request
            let _ = context.demand_store();
        }

        info!(
            recommendation_status = ?context.engine.stats().status,
            forecast_model = context.model.is_some(),
            "serving context ready"
        );
        Ok(context)
    }

    /// Assemble from already-loaded parts
    pub fn from_parts(
        config: ServingConfig,
        engine: RecommendationEngine,
        model: Option<ForecastModel>,
        demand_loader: DemandLoader,
    ) -> Result<Self> {
        config.validate()?;
        let trend_rule = config.trend_rule()?;
        let forecast_settings = config.forecast_settings();

        Ok(Self {
            config,
            engine,
            model,
            trend_rule,
            forecast_settings,
            demand_loader,
            demand: OnceCell::new(),
        })
    }

    /// Use an already-built demand store instead of loading one
    pub fn with_demand_store(self, store: DemandSeriesStore) -> Self {
        let demand = OnceCell::with_value(Some(Arc::new(store)));
        Self { demand, ..self }
    }

    pub fn config(&self) -> &ServingConfig {
        &self.config
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    pub fn forecast_model(&self) -> Option<&ForecastModel> {
        self.model.as_ref()
    }

    /// The demand store, built on first call
    ///
    /// Concurrent first calls run the loader once; the others block until it
    /// finishes. A failed build is remembered.
    pub fn demand_store(&self) -> Result<Arc<DemandSeriesStore>> {
        self.demand
            .get_or_init(|| match (self.demand_loader)() {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!("Could not build demand series store: {}", e);
                    None
                }
            })
            .clone()
            .ok_or_else(|| ServiceError::NotReady("demand data is not loaded".to_string()))
    }

    fn model(&self) -> Result<&ForecastModel> {
        self.model
            .as_ref()
            .ok_or_else(|| ServiceError::NotReady("forecast model is not loaded".to_string()))
    }

    fn forecaster(&self) -> Result<Forecaster<'_>> {
        Ok(Forecaster::new(self.model()?, self.forecast_settings))
    }

    /// Similar products; `cf_weight` falls back to the configured default
    pub fn recommend(
        &self,
        method: Method,
        product_id: &str,
        n: usize,
        cf_weight: Option<f32>,
    ) -> Result<Vec<Recommendation>> {
        debug!(%method, product_id, n, ?cf_weight, "recommend");
        let weight = cf_weight.unwrap_or(self.config.recommend.default_cf_weight);
        Ok(self.engine.recommend(method, product_id, n, Some(weight))?)
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            recommendation: self.engine.stats(),
            forecast_model_loaded: self.model.is_some(),
            demand_data_loaded: self.demand.get().map(Option::is_some),
        }
    }

    pub fn demand_stats(&self) -> Result<DemandStats> {
        Ok(self.demand_store()?.stats())
    }

    /// Products ranked by total historical demand
    pub fn top_products(&self, limit: usize) -> Result<Vec<TopProduct>> {
        check_limit(limit)?;
        Ok(self.demand_store()?.top_products(limit))
    }

    pub fn product_demand(&self, product_id: &str) -> Result<ProductDemand> {
        debug!(product_id, "product demand");
        self.demand_store()?
            .product_summary(product_id, &self.trend_rule)
            .ok_or_else(|| ServiceError::NotFound(format!("No demand history for product {}", product_id)))
    }

    /// Forecast `weeks` weeks of demand for one product
    pub fn forecast(&self, product_id: &str, weeks: usize) -> Result<DemandForecast> {
        debug!(product_id, weeks, "forecast");
        self.forecast_settings.check_horizon(weeks)?;
        let forecaster = self.forecaster()?;
        let store = self.demand_store()?;
        Ok(forecaster.forecast_product(&store, product_id, weeks)?)
    }

    /// Forecast the last `holdout` real weeks from the weeks before them
    pub fn backtest(&self, product_id: &str, holdout: usize) -> Result<BacktestReport> {
        check_holdout(holdout)?;
        let forecaster = self.forecaster()?;
        let store = self.demand_store()?;
        let series = store
            .series(product_id)
            .ok_or_else(|| ServiceError::NotFound(format!("No demand history for product {}", product_id)))?;
        Ok(backtest(&forecaster, series, holdout)?)
    }

    pub fn overall_trend(&self) -> Result<Vec<WeeklyTotal>> {
        Ok(self.demand_store()?.overall_trend())
    }

    /// Demand grouped by first catalog category
    pub fn category_demand(&self, limit: usize) -> Result<Vec<CategoryDemand>> {
        check_limit(limit)?;
        let store = self.demand_store()?;
        let catalog = self
            .engine
            .artifacts()
            .catalog
            .as_ref()
            .ok_or_else(|| ServiceError::NotReady("product metadata is not loaded".to_string()))?;

        Ok(store.category_demand(
            |id| catalog.get(id).and_then(|p| p.categories.first().cloned()),
            limit,
        ))
    }

    pub fn product(&self, product_id: &str) -> Result<Product> {
        Ok(self.engine.product(product_id)?.clone())
    }

    pub fn products(&self, limit: usize, offset: usize) -> Result<ProductPage> {
        Ok(self.engine.products(limit, offset)?)
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>> {
        Ok(self.engine.search(query, limit)?)
    }
}

fn check_limit(limit: usize) -> Result<()> {
    if limit == 0 || limit > MAX_TOP_LIMIT {
        return Err(ServiceError::InvalidArgument(format!(
            "limit must be between 1 and {}, got {}",
            MAX_TOP_LIMIT, limit
        )));
    }
    Ok(())
}
