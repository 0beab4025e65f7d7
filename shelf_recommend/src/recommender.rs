//! Collaborative and content-based recommenders

use crate::catalog::Catalog;
use crate::error::{RecommendError, Result};
use crate::index::ProductIndex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Recommendation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Collaborative,
    Content,
    Hybrid,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Collaborative => "collaborative",
            Method::Content => "content",
            Method::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl FromStr for Method {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "collaborative" | "cf" => Ok(Method::Collaborative),
            "content" | "cb" => Ok(Method::Content),
            "hybrid" => Ok(Method::Hybrid),
            other => Err(RecommendError::InvalidArgument(format!(
                "unknown recommendation method: {}",
                other
            ))),
        }
    }
}

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub product_id: String,
    pub score: f32,
    pub method: Method,
}

/// Descending score, then ascending identifier
pub(crate) fn rank_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.product_id.cmp(&b.product_id))
}

/// Common interface of the similarity-based recommenders
pub trait Recommender: Send + Sync {
    /// Method tag attached to every result
    fn method(&self) -> Method;

    /// Up to `n` products most similar to `product_id`, best first
    fn recommend(&self, product_id: &str, n: usize) -> Result<Vec<Recommendation>>;
}

/// Nearest-neighbour recommender over one [`ProductIndex`].
///
/// The same logic serves the collaborative and content variants; only the
/// index (and therefore coverage) differs.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityRecommender<'a> {
    method: Method,
    index: Option<&'a ProductIndex>,
    catalog: Option<&'a Catalog>,
}

impl<'a> SimilarityRecommender<'a> {
    /// `index` is `None` when its artifact failed to load. When a catalog is
    /// given, neighbours without metadata are never surfaced.
    pub fn new(method: Method, index: Option<&'a ProductIndex>, catalog: Option<&'a Catalog>) -> Self {
        Self {
            method,
            index,
            catalog,
        }
    }

    pub fn collaborative(index: Option<&'a ProductIndex>, catalog: Option<&'a Catalog>) -> Self {
        Self::new(Method::Collaborative, index, catalog)
    }

    pub fn content(index: Option<&'a ProductIndex>, catalog: Option<&'a Catalog>) -> Self {
        Self::new(Method::Content, index, catalog)
    }
}

impl Recommender for SimilarityRecommender<'_> {
    fn method(&self) -> Method {
        self.method
    }

    fn recommend(&self, product_id: &str, n: usize) -> Result<Vec<Recommendation>> {
        let index = self.index.ok_or_else(|| {
            RecommendError::NotReady(format!("{} index is not loaded", self.method))
        })?;

        let row = index.mapping().row(product_id).ok_or_else(|| {
            RecommendError::NotFound(format!(
                "product {} is not in the {} index",
                product_id, self.method
            ))
        })?;

        if n == 0 {
            return Ok(Vec::new());
        }

        // n + 1 because the product is normally its own nearest neighbour
        let neighbors = index.index().kneighbors_of_row(row, n + 1)?;

        let mut results: Vec<Recommendation> = neighbors
            .into_iter()
            .filter(|neighbor| neighbor.row != row)
            .filter_map(|neighbor| {
                let id = index.mapping().id(neighbor.row)?;
                if let Some(catalog) = self.catalog {
                    if !catalog.contains(id) {
                        return None;
                    }
                }
                Some(Recommendation {
                    product_id: id.to_string(),
                    score: neighbor.similarity(),
                    method: self.method,
                })
            })
            .collect();

        results.sort_by(rank_order);
        results.truncate(n);

        debug!(
            "{} recommendations for {}: {} results",
            self.method,
            product_id,
            results.len()
        );

        Ok(results)
    }
}
