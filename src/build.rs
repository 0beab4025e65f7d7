//! Offline derivation of the recommendation artifacts
//!
//! Turns the raw interaction log and the product metadata dump into the
//! files [`crate::ServingContext::load`] reads: the ID mappings, the
//! item x user matrix and the TF-IDF matrix. The metadata file is copied
//! alongside them.

use crate::error::{Result, ServiceError};
use serde::Serialize;
use shelf_forecast::InteractionLog;
use shelf_recommend::artifacts::{
    COLLABORATIVE_MATRIX_FILE, CONTENT_MATRIX_FILE, MAPPINGS_FILE, METADATA_FILE,
};
use shelf_recommend::{build_content_index, Catalog, InteractionMatrix, MappingsFile};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Default cold-start threshold for the collaborative index
pub const DEFAULT_MIN_INTERACTIONS: usize = 5;
/// Default TF-IDF vocabulary size
pub const DEFAULT_MAX_FEATURES: usize = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub reviews_path: PathBuf,
    pub metadata_path: PathBuf,
    pub out_dir: PathBuf,
    pub min_interactions: usize,
    pub max_features: usize,
}

/// What was written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSummary {
    pub interactions: usize,
    pub collaborative_products: usize,
    pub users: usize,
    pub sparsity: f64,
    pub content_products: usize,
    pub vocabulary: usize,
    pub out_dir: PathBuf,
}

fn build_error<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> ServiceError + '_ {
    move |e| ServiceError::Build(format!("{}: {}", context, e))
}

/// Build and write every recommendation artifact
pub fn build_artifacts(options: &BuildOptions) -> Result<BuildSummary> {
    let log = InteractionLog::from_path(&options.reviews_path).map_err(build_error("reading interactions"))?;
    let interactions = InteractionMatrix::build(log.user_product_pairs(), options.min_interactions)
        .map_err(build_error("building interaction matrix"))?;
    let users = interactions.user_count();
    let sparsity = interactions.sparsity();

    let catalog = Catalog::from_jsonl(&options.metadata_path).map_err(build_error("reading metadata"))?;
    let (content_mapping, content_matrix) = build_content_index(catalog.iter(), options.max_features)
        .map_err(build_error("building content matrix"))?;
    let (collaborative_mapping, collaborative_matrix) = interactions.into_parts();

    let out = &options.out_dir;
    fs::create_dir_all(out).map_err(build_error("creating output directory"))?;
    MappingsFile::from_mappings(&collaborative_mapping, &content_mapping)
        .save(out.join(MAPPINGS_FILE))
        .map_err(build_error("writing mappings"))?;
    collaborative_matrix
        .save(out.join(COLLABORATIVE_MATRIX_FILE))
        .map_err(build_error("writing interaction matrix"))?;
    content_matrix
        .save(out.join(CONTENT_MATRIX_FILE))
        .map_err(build_error("writing content matrix"))?;

    let metadata_target = out.join(METADATA_FILE);
    let same_file = fs::canonicalize(&options.metadata_path).ok() == fs::canonicalize(&metadata_target).ok()
        && metadata_target.exists();
    if !same_file {
        fs::copy(&options.metadata_path, &metadata_target).map_err(build_error("copying metadata"))?;
    }

    let summary = BuildSummary {
        interactions: log.len(),
        collaborative_products: collaborative_mapping.len(),
        users,
        sparsity,
        content_products: content_mapping.len(),
        vocabulary: content_matrix.cols(),
        out_dir: out.clone(),
    };
    info!(
        collaborative_products = summary.collaborative_products,
        content_products = summary.content_products,
        out_dir = %out.display(),
        "wrote recommendation artifacts"
    );
    Ok(summary)
}
