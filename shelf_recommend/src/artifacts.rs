//! Loading of the recommendation artifacts
//!
//! Each artifact loads independently. A failure is logged and leaves the
//! corresponding capability unavailable; it never aborts the load.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::index::ProductIndex;
use crate::mapping::{IdMapping, MappingsFile};
use crate::sparse::CsrMatrix;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const MAPPINGS_FILE: &str = "recommendation_mappings.json";
pub const COLLABORATIVE_MATRIX_FILE: &str = "item_user_matrix.json";
pub const CONTENT_MATRIX_FILE: &str = "tfidf_matrix.json";
pub const METADATA_FILE: &str = "products.jsonl";

/// Locations of the recommendation artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub mappings: PathBuf,
    pub collaborative_matrix: PathBuf,
    pub content_matrix: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside one artifact directory
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            mappings: dir.join(MAPPINGS_FILE),
            collaborative_matrix: dir.join(COLLABORATIVE_MATRIX_FILE),
            content_matrix: dir.join(CONTENT_MATRIX_FILE),
            metadata: dir.join(METADATA_FILE),
        }
    }
}

/// Everything the recommenders read at serving time
#[derive(Debug, Clone, Default)]
pub struct RecommendationArtifacts {
    pub collaborative: Option<ProductIndex>,
    pub content: Option<ProductIndex>,
    pub catalog: Option<Catalog>,
    pub mappings_loaded: bool,
}

impl RecommendationArtifacts {
    /// Assemble from already-built parts
    pub fn from_parts(
        collaborative: Option<ProductIndex>,
        content: Option<ProductIndex>,
        catalog: Option<Catalog>,
    ) -> Self {
        let mappings_loaded = collaborative.is_some() || content.is_some();
        Self {
            collaborative,
            content,
            catalog,
            mappings_loaded,
        }
    }

    /// Load every artifact that can be loaded
    pub fn load(paths: &ArtifactPaths) -> Self {
        let mappings = match MappingsFile::load(&paths.mappings) {
            Ok(mappings) => Some(mappings),
            Err(e) => {
                warn!("Could not load ID mappings from {:?}: {}", paths.mappings, e);
                None
            }
        };

        let collaborative = mappings.as_ref().and_then(|m| {
            load_index(
                "collaborative",
                m.collaborative(),
                &paths.collaborative_matrix,
            )
        });
        let content = mappings
            .as_ref()
            .and_then(|m| load_index("content", m.content(), &paths.content_matrix));

        let catalog = match Catalog::from_jsonl(&paths.metadata) {
            Ok(catalog) => {
                info!("Loaded metadata for {} products", catalog.len());
                Some(catalog)
            }
            Err(e) => {
                warn!("Could not load product metadata from {:?}: {}", paths.metadata, e);
                None
            }
        };

        Self {
            collaborative,
            content,
            catalog,
            mappings_loaded: mappings.is_some(),
        }
    }
}

fn load_index(name: &str, mapping: Result<IdMapping>, matrix_path: &Path) -> Option<ProductIndex> {
    let mapping = match mapping {
        Ok(mapping) if !mapping.is_empty() => mapping,
        Ok(_) => {
            warn!("No {} ID mapping present; {} recommendations disabled", name, name);
            return None;
        }
        Err(e) => {
            warn!("Invalid {} ID mapping: {}", name, e);
            return None;
        }
    };

    match CsrMatrix::load(matrix_path) {
        Ok(matrix) => {
            info!(
                "Loaded {} index: {} rows, {} columns, sparsity {:.4}",
                name,
                matrix.rows(),
                matrix.cols(),
                matrix.sparsity()
            );
            Some(ProductIndex::new(mapping, matrix))
        }
        Err(e) => {
            warn!("Could not load {} matrix from {:?}: {}", name, matrix_path, e);
            None
        }
    }
}
