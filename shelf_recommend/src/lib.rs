//! # Shelf Recommend
//!
//! Item-to-item product recommendations served from pre-built artifacts.
//!
//! ## Features
//!
//! - Collaborative filtering: cosine kNN over a binary item x user matrix
//! - Content-based filtering: cosine kNN over TF-IDF vectors of titles and categories
//! - Hybrid blending of both with a tunable collaborative weight
//! - Product metadata normalisation, listing and search
//! - Offline builders for the interaction matrix and the TF-IDF matrix
//!
//! ## Quick Start
//!
//! ```no_run
//! use shelf_recommend::{ArtifactPaths, Method, RecommendationEngine};
//!
//! let engine = RecommendationEngine::load(&ArtifactPaths::in_dir("ml/models"), 20);
//! let similar = engine.recommend(Method::Hybrid, "B000123", 6, Some(0.6))?;
//! for rec in similar {
//!     println!("{} {:.3}", rec.product_id, rec.score);
//! }
//! # Ok::<(), shelf_recommend::RecommendError>(())
//! ```

pub mod artifacts;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod hybrid;
pub mod index;
pub mod interactions;
pub mod mapping;
pub mod recommender;
pub mod sparse;
pub mod tfidf;

// Re-export commonly used types
pub use crate::artifacts::{ArtifactPaths, RecommendationArtifacts};
pub use crate::catalog::{Catalog, Product};
pub use crate::engine::{ProductPage, Readiness, RecommendationEngine, RecommendationStats};
pub use crate::error::{RecommendError, Result};
pub use crate::hybrid::{HybridBlender, DEFAULT_CF_WEIGHT};
pub use crate::index::{ProductIndex, SimilarityIndex};
pub use crate::interactions::InteractionMatrix;
pub use crate::mapping::{IdMapping, MappingsFile};
pub use crate::recommender::{Method, Recommendation, Recommender, SimilarityRecommender};
pub use crate::sparse::CsrMatrix;
pub use crate::tfidf::{build_content_index, TfidfVectorizer};
