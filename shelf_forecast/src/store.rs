//! Weekly demand series aggregated from the interaction log

use crate::data::{InteractionLog, InteractionRecord};
use crate::trend::{Trend, TrendRule};
use crate::week::WeekId;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Default number of weeks a product needs before it can be forecast
pub const DEFAULT_MIN_FORECAST_WEEKS: usize = 4;

/// Demand for one product in one ISO week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandPoint {
    pub week: WeekId,
    /// Number of interactions in the week
    pub demand: u32,
    /// Mean of the ratings present in the week
    pub avg_rating: Option<f64>,
}

/// Ascending weekly series for one product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSeries {
    product_id: String,
    points: Vec<DemandPoint>,
}

impl ProductSeries {
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn points(&self) -> &[DemandPoint] {
        &self.points
    }

    /// Demand values as floats, oldest first
    pub fn demands(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.demand as f64).collect()
    }

    pub fn total_demand(&self) -> u64 {
        self.points.iter().map(|p| p.demand as u64).sum()
    }

    pub fn first_week(&self) -> Option<WeekId> {
        self.points.first().map(|p| p.week)
    }

    pub fn last_week(&self) -> Option<WeekId> {
        self.points.last().map(|p| p.week)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The first `len` weeks as a new series
    pub fn head(&self, len: usize) -> ProductSeries {
        ProductSeries {
            product_id: self.product_id.clone(),
            points: self.points.iter().take(len).cloned().collect(),
        }
    }
}

/// First and last week with any demand
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekRange {
    pub start: WeekId,
    pub end: WeekId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandStats {
    pub total_products: usize,
    pub total_weeks: usize,
    pub total_demand: u64,
    pub week_range: Option<WeekRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: String,
    pub total_demand: u64,
    pub avg_weekly_demand: f64,
    pub num_weeks: usize,
    /// Mean of the weekly average ratings
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDemand {
    pub product_id: String,
    pub total_demand: u64,
    pub avg_weekly_demand: f64,
    pub max_weekly_demand: u32,
    pub min_weekly_demand: u32,
    pub num_weeks: usize,
    pub trend: Trend,
    pub time_series: Vec<DemandPoint>,
}

/// Store-wide demand for one week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotal {
    pub week: WeekId,
    pub total_demand: u64,
    pub active_products: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDemand {
    pub category: String,
    pub total_demand: u64,
    pub num_products: usize,
}

#[derive(Default)]
struct WeekBucket {
    demand: u32,
    rating_sum: f64,
    rating_count: u32,
}

/// Immutable per-product weekly demand, built once from the interaction log
#[derive(Debug, Clone, PartialEq)]
pub struct DemandSeriesStore {
    series: BTreeMap<String, ProductSeries>,
    weeks: BTreeSet<WeekId>,
    total_demand: u64,
    min_forecast_weeks: usize,
}

impl DemandSeriesStore {
    /// Aggregate records into weekly buckets per product
    ///
    /// Records whose timestamp is out of the representable range are skipped.
    /// The result does not depend on record order.
    pub fn from_records<'a, I>(records: I, min_forecast_weeks: usize) -> Self
    where
        I: IntoIterator<Item = &'a InteractionRecord>,
    {
        let mut buckets: BTreeMap<&'a str, BTreeMap<WeekId, WeekBucket>> = BTreeMap::new();
        let mut skipped = 0usize;

        for record in records {
            let Some(week) = WeekId::from_timestamp_millis(record.timestamp_ms) else {
                skipped += 1;
                continue;
            };
            let bucket = buckets
                .entry(record.product_id.as_str())
                .or_default()
                .entry(week)
                .or_default();
            bucket.demand += 1;
            if let Some(rating) = record.rating.filter(|r| r.is_finite()) {
                bucket.rating_sum += rating;
                bucket.rating_count += 1;
            }
        }

        if skipped > 0 {
            warn!(skipped, "skipped interactions with invalid timestamps");
        }

        let mut weeks = BTreeSet::new();
        let mut total_demand = 0u64;
        let series = buckets
            .into_iter()
            .map(|(product_id, product_weeks)| {
                let points: Vec<DemandPoint> = product_weeks
                    .into_iter()
                    .map(|(week, bucket)| {
                        weeks.insert(week);
                        total_demand += bucket.demand as u64;
                        DemandPoint {
                            week,
                            demand: bucket.demand,
                            avg_rating: (bucket.rating_count > 0)
                                .then(|| bucket.rating_sum / bucket.rating_count as f64),
                        }
                    })
                    .collect();
                let series = ProductSeries {
                    product_id: product_id.to_string(),
                    points,
                };
                (product_id.to_string(), series)
            })
            .collect();

        Self {
            series,
            weeks,
            total_demand,
            min_forecast_weeks,
        }
    }

    /// Build from a loaded log and report the outcome
    pub fn from_log(log: &InteractionLog, min_forecast_weeks: usize) -> Self {
        let store = Self::from_records(log.records(), min_forecast_weeks);
        info!(
            products = store.product_count(),
            weeks = store.week_count(),
            total_demand = store.total_demand,
            forecastable = store.forecastable_products().count(),
            "built demand series store"
        );
        store
    }

    pub fn product_count(&self) -> usize {
        self.series.len()
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn total_demand(&self) -> u64 {
        self.total_demand
    }

    pub fn min_forecast_weeks(&self) -> usize {
        self.min_forecast_weeks
    }

    pub fn week_range(&self) -> Option<WeekRange> {
        match (self.weeks.first(), self.weeks.last()) {
            (Some(&start), Some(&end)) => Some(WeekRange { start, end }),
            _ => None,
        }
    }

    pub fn stats(&self) -> DemandStats {
        DemandStats {
            total_products: self.product_count(),
            total_weeks: self.week_count(),
            total_demand: self.total_demand,
            week_range: self.week_range(),
        }
    }

    pub fn series(&self, product_id: &str) -> Option<&ProductSeries> {
        self.series.get(product_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductSeries> {
        self.series.values()
    }

    /// Whether a product has enough weeks of history to be forecast
    pub fn is_forecastable(&self, product_id: &str) -> bool {
        self.series
            .get(product_id)
            .map(|s| s.len() >= self.min_forecast_weeks)
            .unwrap_or(false)
    }

    pub fn forecastable_products(&self) -> impl Iterator<Item = &str> {
        self.series
            .values()
            .filter(|s| s.len() >= self.min_forecast_weeks)
            .map(|s| s.product_id())
    }

    /// Products by descending total demand, ties by identifier
    pub fn top_products(&self, limit: usize) -> Vec<TopProduct> {
        let mut ranked: Vec<TopProduct> = self
            .series
            .values()
            .map(|series| {
                let ratings: Vec<f64> = series.points.iter().filter_map(|p| p.avg_rating).collect();
                TopProduct {
                    product_id: series.product_id.clone(),
                    total_demand: series.total_demand(),
                    avg_weekly_demand: Statistics::mean(&series.demands()),
                    num_weeks: series.len(),
                    avg_rating: (!ratings.is_empty()).then(|| Statistics::mean(&ratings)),
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.total_demand
                .cmp(&a.total_demand)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Summary statistics, trend and full series for one product
    pub fn product_summary(&self, product_id: &str, rule: &TrendRule) -> Option<ProductDemand> {
        let series = self.series.get(product_id)?;
        let demands = series.demands();
        let max_weekly_demand = series.points.iter().map(|p| p.demand).fold(0, u32::max);
        let min_weekly_demand = series
            .points
            .iter()
            .map(|p| p.demand)
            .fold(u32::MAX, u32::min);

        Some(ProductDemand {
            product_id: series.product_id.clone(),
            total_demand: series.total_demand(),
            avg_weekly_demand: Statistics::mean(&demands),
            max_weekly_demand,
            min_weekly_demand,
            num_weeks: series.len(),
            trend: rule.classify(&demands),
            time_series: series.points.clone(),
        })
    }

    /// Total demand and number of active products per week, ascending
    pub fn overall_trend(&self) -> Vec<WeeklyTotal> {
        let mut totals: BTreeMap<WeekId, (u64, usize)> = BTreeMap::new();
        for point in self.series.values().flat_map(|s| s.points.iter()) {
            let entry = totals.entry(point.week).or_default();
            entry.0 += point.demand as u64;
            entry.1 += 1;
        }

        totals
            .into_iter()
            .map(|(week, (total_demand, active_products))| WeeklyTotal {
                week,
                total_demand,
                active_products,
            })
            .collect()
    }

    /// Demand grouped by each product's first category
    ///
    /// `first_category` resolves a product id to its category; products it
    /// returns `None` for are left out. Categories are ranked by descending
    /// demand, ties by name.
    pub fn category_demand<F>(&self, first_category: F, limit: usize) -> Vec<CategoryDemand>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut groups: BTreeMap<String, (u64, usize)> = BTreeMap::new();
        for series in self.series.values() {
            if let Some(category) = first_category(&series.product_id) {
                let entry = groups.entry(category).or_default();
                entry.0 += series.total_demand();
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<CategoryDemand> = groups
            .into_iter()
            .map(|(category, (total_demand, num_products))| CategoryDemand {
                category,
                total_demand,
                num_products,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total_demand
                .cmp(&a.total_demand)
                .then_with(|| a.category.cmp(&b.category))
        });
        ranked.truncate(limit);
        ranked
    }
}
