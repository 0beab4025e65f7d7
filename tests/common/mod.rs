#![allow(dead_code)]

use shelf_forecast::{
    DemandSeriesStore, FeatureName, ForecastModel, InteractionRecord, LinearRegressor, ModelInfo, ModelMetrics,
    RegressorArtifact,
};
use shelf_recommend::{
    build_content_index, Catalog, InteractionMatrix, Product, ProductIndex, RecommendationArtifacts,
    RecommendationEngine,
};
use shelfcast::{DemandLoader, ServingConfig, ServingContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 2023-01-02T12:00:00Z, a Monday in ISO week 2023-W01
pub const BASE_MS: i64 = 1_672_660_800_000;
pub const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

pub const INTERACTIONS: &[(&str, &str)] = &[
    ("u1", "A"),
    ("u2", "A"),
    ("u3", "A"),
    ("u1", "B"),
    ("u2", "B"),
    ("u3", "B"),
    ("u1", "C"),
    ("u2", "C"),
    ("u3", "D"),
    ("u4", "D"),
    ("u5", "E"),
    ("u6", "E"),
];

/// Weekly demand per product; A is long enough to forecast, B is not
pub const WEEKLY_DEMAND: &[(&str, &[u32])] = &[
    ("A", &[10, 12, 9, 11, 13, 12, 14, 15]),
    ("B", &[3, 4]),
    ("D", &[1, 1, 2, 1, 1]),
];

pub fn products() -> Vec<Product> {
    [
        ("A", "Steel Chef Knife", "Kitchen"),
        ("B", "Wooden Cutting Board", "Kitchen"),
        ("C", "Steel Paring Knife", "Kitchen"),
        ("D", "Cast Iron Skillet", "Cookware"),
        ("E", "Steel Knife Sharpener", "Kitchen"),
    ]
    .iter()
    .map(|(id, title, category)| {
        let mut product = Product::new(*id, *title);
        product.categories.push(category.to_string());
        product.image_url = Some(format!("https://img.example/{}.jpg", id));
        product
    })
    .collect()
}

pub fn demand_records() -> Vec<InteractionRecord> {
    let mut records = Vec::new();
    for (product, demands) in WEEKLY_DEMAND {
        for (week, &count) in demands.iter().enumerate() {
            for i in 0..count {
                let user = format!("u{}", i);
                records.push(InteractionRecord::new(
                    Some(user.as_str()),
                    product,
                    BASE_MS + week as i64 * WEEK_MS,
                    Some(4.0),
                ));
            }
        }
    }
    records
}

pub fn engine() -> RecommendationEngine {
    let (cf_mapping, cf_matrix) = InteractionMatrix::build(INTERACTIONS.iter().copied(), 2)
        .unwrap()
        .into_parts();
    let (cb_mapping, cb_matrix) = build_content_index(&products(), 100).unwrap();

    let artifacts = RecommendationArtifacts::from_parts(
        Some(ProductIndex::new(cf_mapping, cf_matrix)),
        Some(ProductIndex::new(cb_mapping, cb_matrix)),
        Some(Catalog::from_products(products())),
    );
    RecommendationEngine::new(artifacts, 20)
}

/// Predicts last week's demand
pub fn persistence_model() -> ForecastModel {
    let info = ModelInfo {
        model_type: "LinearRegression".to_string(),
        features: vec![FeatureName::Lag1],
        metrics: ModelMetrics { mae: Some(1.5) },
    };
    let regressor = RegressorArtifact::Linear(LinearRegressor::new(0.0, vec![1.0]).unwrap());
    ForecastModel::new(regressor, info).unwrap()
}

/// A loader over [`demand_records`] that counts its invocations
pub fn counting_loader(calls: Arc<AtomicUsize>) -> DemandLoader {
    Box::new(move || -> shelf_forecast::Result<DemandSeriesStore> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(DemandSeriesStore::from_records(&demand_records(), 4))
    })
}

pub fn context(model: Option<ForecastModel>) -> (ServingContext, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let context = ServingContext::from_parts(
        ServingConfig::default(),
        engine(),
        model,
        counting_loader(Arc::clone(&calls)),
    )
    .unwrap();
    (context, calls)
}
