//! Recommendation entry points over one loaded artifact set

use crate::artifacts::{ArtifactPaths, RecommendationArtifacts};
use crate::catalog::{Catalog, Product};
use crate::error::{RecommendError, Result};
use crate::hybrid::{HybridBlender, DEFAULT_CF_WEIGHT};
use crate::recommender::{Method, Recommendation, Recommender, SimilarityRecommender};
use serde::Serialize;

/// Default upper bound on the result count of one request
pub const DEFAULT_MAX_RESULTS: usize = 20;
/// Largest page for listing and search
pub const MAX_PAGE_SIZE: usize = 100;
/// Shortest accepted search query
pub const MIN_QUERY_CHARS: usize = 2;

/// Overall state of the recommendation artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Partial,
    NotLoaded,
}

/// Which artifacts made it into memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelsLoaded {
    pub mappings: bool,
    pub collaborative_index: bool,
    pub content_index: bool,
    pub metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationStats {
    pub status: Readiness,
    pub total_products: usize,
    pub products_with_content: usize,
    pub products_with_metadata: usize,
    pub models_loaded: ModelsLoaded,
}

/// One page of the product listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Immutable recommendation service state
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    artifacts: RecommendationArtifacts,
    max_results: usize,
}

impl RecommendationEngine {
    pub fn new(artifacts: RecommendationArtifacts, max_results: usize) -> Self {
        Self {
            artifacts,
            max_results: max_results.max(1),
        }
    }

    /// Load the artifacts from disk, degrading per capability on failure
    pub fn load(paths: &ArtifactPaths, max_results: usize) -> Self {
        Self::new(RecommendationArtifacts::load(paths), max_results)
    }

    pub fn artifacts(&self) -> &RecommendationArtifacts {
        &self.artifacts
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn collaborative(&self) -> SimilarityRecommender<'_> {
        SimilarityRecommender::collaborative(
            self.artifacts.collaborative.as_ref(),
            self.artifacts.catalog.as_ref(),
        )
    }

    pub fn content(&self) -> SimilarityRecommender<'_> {
        SimilarityRecommender::content(self.artifacts.content.as_ref(), self.artifacts.catalog.as_ref())
    }

    /// Ranked recommendations for `product_id`.
    ///
    /// `cf_weight` only applies to [`Method::Hybrid`] and defaults to 0.6.
    pub fn recommend(
        &self,
        method: Method,
        product_id: &str,
        n: usize,
        cf_weight: Option<f32>,
    ) -> Result<Vec<Recommendation>> {
        if n == 0 || n > self.max_results {
            return Err(RecommendError::InvalidArgument(format!(
                "n must be between 1 and {}, got {}",
                self.max_results, n
            )));
        }

        match method {
            Method::Collaborative => self.collaborative().recommend(product_id, n),
            Method::Content => self.content().recommend(product_id, n),
            Method::Hybrid => {
                let collaborative = self.collaborative();
                let content = self.content();
                HybridBlender::new(&collaborative, &content).blend(
                    product_id,
                    n,
                    cf_weight.unwrap_or(DEFAULT_CF_WEIGHT),
                )
            }
        }
    }

    pub fn stats(&self) -> RecommendationStats {
        let models_loaded = ModelsLoaded {
            mappings: self.artifacts.mappings_loaded,
            collaborative_index: self.artifacts.collaborative.is_some(),
            content_index: self.artifacts.content.is_some(),
            metadata: self.artifacts.catalog.is_some(),
        };

        let status = if models_loaded.collaborative_index
            && models_loaded.content_index
            && models_loaded.metadata
        {
            Readiness::Ready
        } else if models_loaded.collaborative_index || models_loaded.content_index {
            Readiness::Partial
        } else {
            Readiness::NotLoaded
        };

        RecommendationStats {
            status,
            total_products: self
                .artifacts
                .collaborative
                .as_ref()
                .map_or(0, |index| index.product_count()),
            products_with_content: self
                .artifacts
                .content
                .as_ref()
                .map_or(0, |index| index.product_count()),
            products_with_metadata: self.artifacts.catalog.as_ref().map_or(0, Catalog::len),
            models_loaded,
        }
    }

    fn catalog(&self) -> Result<&Catalog> {
        self.artifacts
            .catalog
            .as_ref()
            .ok_or_else(|| RecommendError::NotReady("product metadata is not loaded".to_string()))
    }

    pub fn product(&self, product_id: &str) -> Result<&Product> {
        self.catalog()?
            .get(product_id)
            .ok_or_else(|| RecommendError::NotFound(format!("product {} has no metadata", product_id)))
    }

    /// Products that are recommendable and have an image, in index order
    pub fn products(&self, limit: usize, offset: usize) -> Result<ProductPage> {
        check_page_size(limit)?;
        let catalog = self.catalog()?;

        let listed: Vec<&Product> = match &self.artifacts.collaborative {
            Some(index) => index
                .mapping()
                .ids()
                .filter_map(|id| catalog.get(id))
                .filter(|p| p.has_image())
                .collect(),
            None => catalog.iter().filter(|p| p.has_image()).collect(),
        };

        Ok(ProductPage {
            total: listed.len(),
            products: listed.into_iter().skip(offset).take(limit).cloned().collect(),
            offset,
            limit,
        })
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>> {
        check_page_size(limit)?;
        if query.trim().chars().count() < MIN_QUERY_CHARS {
            return Err(RecommendError::InvalidArgument(format!(
                "search query must have at least {} characters",
                MIN_QUERY_CHARS
            )));
        }

        Ok(self
            .catalog()?
            .search(query, limit)
            .into_iter()
            .cloned()
            .collect())
    }
}

fn check_page_size(limit: usize) -> Result<()> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(RecommendError::InvalidArgument(format!(
            "limit must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, limit
        )));
    }
    Ok(())
}
