//! Weighted blend of collaborative and content results

use crate::error::{RecommendError, Result};
use crate::recommender::{rank_order, Method, Recommendation, Recommender};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default weight given to the collaborative side
pub const DEFAULT_CF_WEIGHT: f32 = 0.6;

/// Combines two recommenders with `score = a * cf + (1 - a) * content`
pub struct HybridBlender<'a> {
    collaborative: &'a dyn Recommender,
    content: &'a dyn Recommender,
}

impl<'a> HybridBlender<'a> {
    pub fn new(collaborative: &'a dyn Recommender, content: &'a dyn Recommender) -> Self {
        Self {
            collaborative,
            content,
        }
    }

    /// Blend up to `n` results for `product_id`.
    ///
    /// Each side is over-fetched to `2n`. If one side fails as not found or not
    /// ready the other is used alone at weight 1.0; the call only fails when
    /// both sides do. A product missing from one side contributes 0 from it,
    /// and a side weighted 0 contributes no products at all.
    pub fn blend(&self, product_id: &str, n: usize, cf_weight: f32) -> Result<Vec<Recommendation>> {
        if !cf_weight.is_finite() || !(0.0..=1.0).contains(&cf_weight) {
            return Err(RecommendError::InvalidArgument(format!(
                "cf_weight must be within [0, 1], got {}",
                cf_weight
            )));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let fetch = n.saturating_mul(2);
        let cf = self.collaborative.recommend(product_id, fetch);
        let content = self.content.recommend(product_id, fetch);

        let sources = match (cf, content) {
            (Ok(cf), Ok(content)) => vec![(cf, cf_weight), (content, 1.0 - cf_weight)],
            (Ok(cf), Err(e)) if e.is_source_unavailable() => {
                warn!("Hybrid for {}: content side unavailable ({}), using collaborative only", product_id, e);
                vec![(cf, 1.0)]
            }
            (Err(e), Ok(content)) if e.is_source_unavailable() => {
                warn!("Hybrid for {}: collaborative side unavailable ({}), using content only", product_id, e);
                vec![(content, 1.0)]
            }
            (Err(cf_err), Err(content_err))
                if cf_err.is_source_unavailable() && content_err.is_source_unavailable() =>
            {
                return Err(Self::both_failed(product_id, cf_err, content_err));
            }
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };

        let mut scores: BTreeMap<String, f32> = BTreeMap::new();
        // A zero-weight side would only add 0.0 entries to the tail.
        for (results, weight) in sources.into_iter().filter(|(_, weight)| *weight > 0.0) {
            for rec in results {
                *scores.entry(rec.product_id).or_insert(0.0) += weight * rec.score;
            }
        }

        let mut blended: Vec<Recommendation> = scores
            .into_iter()
            .map(|(product_id, score)| Recommendation {
                product_id,
                score,
                method: Method::Hybrid,
            })
            .collect();

        blended.sort_by(rank_order);
        blended.truncate(n);

        debug!("hybrid recommendations for {}: {} results", product_id, blended.len());

        Ok(blended)
    }

    fn both_failed(
        product_id: &str,
        cf_err: RecommendError,
        content_err: RecommendError,
    ) -> RecommendError {
        match (cf_err, content_err) {
            (RecommendError::NotReady(_), RecommendError::NotReady(_)) => RecommendError::NotReady(
                "neither the collaborative nor the content index is loaded".to_string(),
            ),
            _ => RecommendError::NotFound(format!(
                "product {} is in neither the collaborative nor the content index",
                product_id
            )),
        }
    }
}
