mod common;

use pretty_assertions::assert_eq;
use rstest::rstest;
use shelf_recommend::{
    HybridBlender, Method, RecommendError, RecommendationArtifacts, RecommendationEngine,
    Recommender, SimilarityRecommender,
};

fn ids(recs: &[shelf_recommend::Recommendation]) -> Vec<String> {
    recs.iter().map(|r| r.product_id.clone()).collect()
}

#[test]
fn test_hybrid_is_deterministic() {
    let engine = common::engine();
    let first = engine.recommend(Method::Hybrid, "A", 4, Some(0.6)).unwrap();
    let second = engine.recommend(Method::Hybrid, "A", 4, Some(0.6)).unwrap();
    assert_eq!(first, second);
    assert!(first.iter().all(|r| r.method == Method::Hybrid));
}

#[rstest]
#[case("A", 2)]
#[case("A", 4)]
#[case("A", 6)]
#[case("D", 5)]
#[case("E", 5)]
fn test_full_cf_weight_matches_collaborative(#[case] product_id: &str, #[case] n: usize) {
    let engine = common::engine();
    let hybrid = engine.recommend(Method::Hybrid, product_id, n, Some(1.0)).unwrap();
    let collaborative = engine.recommend(Method::Collaborative, product_id, n, None).unwrap();

    assert_eq!(ids(&hybrid), ids(&collaborative));
    for (h, c) in hybrid.iter().zip(&collaborative) {
        assert_eq!(h.score, c.score);
    }
}

#[rstest]
#[case("A", 2)]
#[case("A", 4)]
#[case("A", 6)]
#[case("D", 5)]
fn test_zero_cf_weight_matches_content(#[case] product_id: &str, #[case] n: usize) {
    let engine = common::engine();
    let hybrid = engine.recommend(Method::Hybrid, product_id, n, Some(0.0)).unwrap();
    let content = engine.recommend(Method::Content, product_id, n, None).unwrap();

    assert_eq!(ids(&hybrid), ids(&content));
    for (h, c) in hybrid.iter().zip(&content) {
        assert_eq!(h.score, c.score);
    }
}

#[test]
fn test_zero_weight_side_adds_no_products() {
    let engine = common::engine();
    // D shares no content terms with anything, so only collaborative neighbours exist
    assert!(engine.content().recommend("D", 5).unwrap().is_empty());
    assert!(!engine.collaborative().recommend("D", 5).unwrap().is_empty());

    let hybrid = engine.recommend(Method::Hybrid, "D", 5, Some(0.0)).unwrap();
    assert!(hybrid.is_empty());
    let hybrid = engine.recommend(Method::Hybrid, "A", 6, Some(1.0)).unwrap();
    assert!(hybrid.iter().all(|r| r.score > 0.0));
}

#[test]
fn test_blend_combines_both_sides_without_renormalising() {
    let engine = common::engine();
    let cf = engine.collaborative().recommend("A", 10).unwrap();
    let content = engine.content().recommend("A", 10).unwrap();
    let hybrid = engine.recommend(Method::Hybrid, "A", 5, Some(0.6)).unwrap();

    for rec in &hybrid {
        let cf_score = cf.iter().find(|r| r.product_id == rec.product_id).map_or(0.0, |r| r.score);
        let cb_score = content
            .iter()
            .find(|r| r.product_id == rec.product_id)
            .map_or(0.0, |r| r.score);
        let expected = 0.6 * cf_score + 0.4 * cb_score;
        assert!((rec.score - expected).abs() < 1e-5, "{} {} {}", rec.product_id, rec.score, expected);
    }
}

#[test]
fn test_falls_back_to_content_when_collaborative_missing() {
    let engine = common::engine();
    // F is only in the content index
    let hybrid = engine.recommend(Method::Hybrid, "F", 3, Some(0.9)).unwrap();
    let content = engine.recommend(Method::Content, "F", 3, None).unwrap();

    assert_eq!(ids(&hybrid), ids(&content));
    for (h, c) in hybrid.iter().zip(&content) {
        assert_eq!(h.score, c.score);
    }
}

#[test]
fn test_falls_back_when_an_index_is_not_loaded() {
    let artifacts = RecommendationArtifacts::from_parts(Some(common::collaborative_index()), None, None);
    let engine = RecommendationEngine::new(artifacts, 20);

    let hybrid = engine.recommend(Method::Hybrid, "A", 3, Some(0.5)).unwrap();
    let collaborative = engine.recommend(Method::Collaborative, "A", 3, None).unwrap();
    assert_eq!(ids(&hybrid), ids(&collaborative));
}

#[test]
fn test_fails_only_when_both_sides_fail() {
    let engine = common::engine();
    assert!(matches!(
        engine.recommend(Method::Hybrid, "G", 3, None),
        Err(RecommendError::NotFound(_))
    ));

    let none = SimilarityRecommender::collaborative(None, None);
    let also_none = SimilarityRecommender::content(None, None);
    let blender = HybridBlender::new(&none, &also_none);
    assert!(matches!(
        blender.blend("A", 3, 0.6),
        Err(RecommendError::NotReady(_))
    ));
}

#[test]
fn test_weight_out_of_range_rejected() {
    let engine = common::engine();
    for weight in [-0.1, 1.5, f32::NAN] {
        assert!(matches!(
            engine.recommend(Method::Hybrid, "A", 3, Some(weight)),
            Err(RecommendError::InvalidArgument(_))
        ));
    }
}

#[test]
fn test_ties_broken_by_identifier() {
    let engine = common::engine();
    let recs = engine.recommend(Method::Hybrid, "A", 6, Some(0.0)).unwrap();
    for pair in recs.windows(2) {
        if pair[0].score == pair[1].score {
            assert!(pair[0].product_id < pair[1].product_id);
        }
    }
}
