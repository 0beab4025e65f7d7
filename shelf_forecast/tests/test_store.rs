mod common;

use common::{record, series_records, BASE_MS};
use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use shelf_forecast::{DemandSeriesStore, InteractionRecord, Trend, TrendRule};

fn sample_records() -> Vec<InteractionRecord> {
    let mut records = vec![
        record("A", "u1", 0, Some(4.0)),
        record("A", "u2", 0, Some(5.0)),
        record("A", "u3", 2, None),
        record("B", "u1", 1, Some(3.0)),
    ];
    records.extend(series_records("C", &[1, 2, 3, 4, 5]));
    records
}

#[test]
fn test_weekly_aggregation() {
    let store = DemandSeriesStore::from_records(&sample_records(), 4);

    let a = store.series("A").unwrap();
    let weeks: Vec<String> = a.points().iter().map(|p| p.week.to_string()).collect();
    assert_eq!(weeks, vec!["2023-W01", "2023-W03"]);
    assert_eq!(a.points()[0].demand, 2);
    assert_eq!(a.points()[0].avg_rating, Some(4.5));
    assert_eq!(a.points()[1].demand, 1);
    assert_eq!(a.points()[1].avg_rating, None);
    assert_eq!(a.total_demand(), 3);
}

#[test]
fn test_stats() {
    let store = DemandSeriesStore::from_records(&sample_records(), 4);
    let stats = store.stats();

    assert_eq!(stats.total_products, 3);
    assert_eq!(stats.total_weeks, 5);
    assert_eq!(stats.total_demand, 3 + 1 + 15);
    let range = stats.week_range.unwrap();
    assert_eq!(range.start.to_string(), "2023-W01");
    assert_eq!(range.end.to_string(), "2023-W05");

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["week_range"]["start"], "2023-W01");
}

#[test]
fn test_forecastable_threshold() {
    let store = DemandSeriesStore::from_records(&sample_records(), 4);

    assert!(store.is_forecastable("C"));
    assert!(!store.is_forecastable("A"));
    assert!(!store.is_forecastable("missing"));
    // non-forecastable products stay queryable
    assert!(store.series("A").is_some());
    assert_eq!(store.forecastable_products().collect::<Vec<_>>(), vec!["C"]);
}

#[test]
fn test_build_is_deterministic() {
    let records = sample_records();
    let mut reversed = records.clone();
    reversed.reverse();

    let first = DemandSeriesStore::from_records(&records, 4);
    let second = DemandSeriesStore::from_records(&records, 4);
    let shuffled = DemandSeriesStore::from_records(&reversed, 4);

    assert_eq!(first, second);
    assert_eq!(first, shuffled);
}

#[test]
fn test_invalid_timestamps_are_skipped() {
    let mut records = sample_records();
    records.push(InteractionRecord::new(Some("u9"), "Z", i64::MAX, None));

    let store = DemandSeriesStore::from_records(&records, 4);
    assert!(store.series("Z").is_none());
    assert_eq!(store.total_demand(), 19);
}

#[test]
fn test_empty_store() {
    let store = DemandSeriesStore::from_records(&Vec::new(), 4);
    let stats = store.stats();
    assert_eq!(stats.total_products, 0);
    assert_eq!(stats.week_range, None);
    assert!(store.top_products(10).is_empty());
    assert!(store.overall_trend().is_empty());
}

#[test]
fn test_top_products() {
    let mut records = sample_records();
    // B ties with A on total demand
    records.push(record("B", "u2", 3, None));
    records.push(record("B", "u3", 3, None));
    let store = DemandSeriesStore::from_records(&records, 4);

    let top = store.top_products(10);
    let ids: Vec<&str> = top.iter().map(|t| t.product_id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A", "B"]);
    assert_eq!(top[0].total_demand, 15);
    assert_eq!(top[0].num_weeks, 5);
    assert_relative_eq!(top[0].avg_weekly_demand, 3.0, epsilon = 1e-9);
    assert_relative_eq!(top[0].avg_rating.unwrap(), 4.0, epsilon = 1e-9);
    assert_eq!(top[1].avg_rating, Some(4.5));

    assert_eq!(store.top_products(1).len(), 1);
}

#[test]
fn test_product_summary() {
    let mut records = series_records("P", &[10, 10, 10, 10, 20, 20, 20, 20]);
    records.extend(series_records("Q", &[3, 1, 2]));
    let store = DemandSeriesStore::from_records(&records, 4);
    let rule = TrendRule::default();

    let p = store.product_summary("P", &rule).unwrap();
    assert_eq!(p.total_demand, 120);
    assert_eq!(p.max_weekly_demand, 20);
    assert_eq!(p.min_weekly_demand, 10);
    assert_relative_eq!(p.avg_weekly_demand, 15.0, epsilon = 1e-9);
    assert_eq!(p.num_weeks, 8);
    assert_eq!(p.trend, Trend::Increasing);
    assert_eq!(p.time_series.len(), 8);

    let q = store.product_summary("Q", &rule).unwrap();
    assert_eq!(q.trend, Trend::InsufficientData);
    assert_eq!(q.min_weekly_demand, 1);

    assert!(store.product_summary("missing", &rule).is_none());
}

#[test]
fn test_overall_trend() {
    let store = DemandSeriesStore::from_records(&sample_records(), 4);
    let weekly = store.overall_trend();

    assert_eq!(weekly.len(), 5);
    // week 0: A x2 + C x1
    assert_eq!(weekly[0].week.to_string(), "2023-W01");
    assert_eq!(weekly[0].total_demand, 3);
    assert_eq!(weekly[0].active_products, 2);
    // week 1: B x1 + C x2
    assert_eq!(weekly[1].total_demand, 3);
    assert_eq!(weekly[1].active_products, 2);
    assert!(weekly.windows(2).all(|w| w[0].week < w[1].week));
}

#[test]
fn test_category_demand() {
    let store = DemandSeriesStore::from_records(&sample_records(), 4);
    let category_of = |id: &str| match id {
        "A" | "C" => Some("Kitchen".to_string()),
        "B" => Some("Garden".to_string()),
        _ => None,
    };

    let groups = store.category_demand(category_of, 15);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].category, "Kitchen");
    assert_eq!(groups[0].total_demand, 18);
    assert_eq!(groups[0].num_products, 2);
    assert_eq!(groups[1].category, "Garden");

    assert_eq!(store.category_demand(category_of, 1).len(), 1);
    assert!(store.category_demand(|_| None, 15).is_empty());
}

#[test]
fn test_week_boundary_uses_utc() {
    // Sunday 23:59 UTC belongs to the previous ISO week
    let sunday_night = BASE_MS - 60 * 1000;
    let records = vec![InteractionRecord::new(None, "X", sunday_night, None)];
    let store = DemandSeriesStore::from_records(&records, 1);
    assert_eq!(store.series("X").unwrap().points()[0].week.to_string(), "2022-W52");
}
