mod common;

use common::{BASE_MS, INTERACTIONS, WEEK_MS};
use pretty_assertions::assert_eq;
use serde_json::json;
use shelfcast::{build_artifacts, BuildOptions, Method, ServiceError, ServingConfig, ServingContext};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let reviews = dir.join("reviews.jsonl");
    let lines: Vec<String> = INTERACTIONS
        .iter()
        .enumerate()
        .map(|(i, (user, product))| {
            json!({
                "user_id": user,
                "parent_asin": product,
                "rating": 4.0,
                "timestamp": BASE_MS + (i as i64 % 5) * WEEK_MS,
            })
            .to_string()
        })
        .collect();
    fs::write(&reviews, lines.join("\n")).unwrap();

    let metadata = dir.join("meta.jsonl");
    let products: Vec<String> = common::products()
        .iter()
        .map(|p| {
            json!({
                "parent_asin": p.product_id,
                "title": p.title,
                "categories": p.categories,
                "images": [{"large": p.image_url}],
            })
            .to_string()
        })
        .collect();
    fs::write(&metadata, products.join("\n")).unwrap();

    (reviews, metadata)
}

#[test]
fn test_build_then_serve() {
    let dir = tempdir().unwrap();
    let (reviews, metadata) = write_inputs(dir.path());
    let out = dir.path().join("models");

    let summary = build_artifacts(&BuildOptions {
        reviews_path: reviews.clone(),
        metadata_path: metadata,
        out_dir: out.clone(),
        min_interactions: 2,
        max_features: 100,
    })
    .unwrap();
    assert_eq!(summary.interactions, INTERACTIONS.len());
    assert_eq!(summary.collaborative_products, 5);
    assert_eq!(summary.users, 6);
    assert_eq!(summary.content_products, 5);

    let config = ServingConfig {
        artifact_dir: out,
        reviews_path: reviews,
        eager_demand: true,
        ..ServingConfig::default()
    };
    let context = ServingContext::load(config).unwrap();

    let stats = context.stats();
    assert_eq!(stats.recommendation.total_products, 5);
    assert!(!stats.forecast_model_loaded);
    assert_eq!(stats.demand_data_loaded, Some(true));

    let ids: Vec<String> = context
        .recommend(Method::Collaborative, "A", 3, None)
        .unwrap()
        .into_iter()
        .map(|r| r.product_id)
        .collect();
    assert_eq!(ids, vec!["B", "C", "D"]);

    assert_eq!(context.demand_stats().unwrap().total_demand, INTERACTIONS.len() as u64);
    assert!(matches!(context.forecast("A", 4), Err(ServiceError::NotReady(_))));
}

#[test]
fn test_missing_artifacts_degrade() {
    let dir = tempdir().unwrap();
    let config = ServingConfig {
        artifact_dir: dir.path().join("nothing"),
        reviews_path: dir.path().join("nothing.jsonl"),
        ..ServingConfig::default()
    };
    let context = ServingContext::load(config).unwrap();

    assert!(matches!(
        context.recommend(Method::Hybrid, "A", 3, None),
        Err(ServiceError::NotReady(_))
    ));
    assert!(matches!(context.demand_stats(), Err(ServiceError::NotReady(_))));
    assert!(matches!(context.product("A"), Err(ServiceError::NotReady(_))));
}

#[test]
fn test_build_reports_bad_input() {
    let dir = tempdir().unwrap();
    let result = build_artifacts(&BuildOptions {
        reviews_path: dir.path().join("missing.jsonl"),
        metadata_path: dir.path().join("missing-meta.jsonl"),
        out_dir: dir.path().join("out"),
        min_interactions: 2,
        max_features: 100,
    });
    assert!(matches!(result, Err(ServiceError::Build(_))));
}
