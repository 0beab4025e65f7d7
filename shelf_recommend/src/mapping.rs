//! Product identifier <-> matrix row mappings

use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Bidirectional mapping between product identifiers and index rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdMapping {
    to_row: HashMap<String, usize>,
    // Sparse so an arbitrary row number in an artifact costs one entry
    to_id: BTreeMap<usize, String>,
}

impl IdMapping {
    /// Build a mapping from `(product_id, row)` pairs; a row or id may appear only once
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut mapping = IdMapping::default();

        for (id, row) in pairs {
            if mapping.to_row.contains_key(&id) {
                return Err(RecommendError::ArtifactError(format!(
                    "product {} is mapped twice",
                    id
                )));
            }
            if mapping.to_id.contains_key(&row) {
                return Err(RecommendError::ArtifactError(format!(
                    "row {} is mapped twice",
                    row
                )));
            }
            mapping.to_id.insert(row, id.clone());
            mapping.to_row.insert(id, row);
        }

        Ok(mapping)
    }

    /// Assign rows 0..n to the identifiers in iteration order
    pub fn from_ordered_ids<I>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_pairs(ids.into_iter().enumerate().map(|(row, id)| (id, row)))
    }

    pub fn row(&self, product_id: &str) -> Option<usize> {
        self.to_row.get(product_id).copied()
    }

    pub fn id(&self, row: usize) -> Option<&str> {
        self.to_id.get(&row).map(String::as_str)
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.to_row.contains_key(product_id)
    }

    pub fn len(&self) -> usize {
        self.to_row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_row.is_empty()
    }

    /// Identifiers in row order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.to_id.values().map(String::as_str)
    }

    /// Drop every entry whose row is `>= rows`; returns how many were dropped
    pub fn truncate_rows(&mut self, rows: usize) -> usize {
        let beyond = self.to_id.split_off(&rows);
        for id in beyond.values() {
            self.to_row.remove(id);
        }
        beyond.len()
    }
}

/// On-disk layout of `recommendation_mappings.json`.
///
/// The `idx_to_*` tables are keyed by the row number rendered as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingsFile {
    #[serde(default)]
    pub product_to_idx: BTreeMap<String, usize>,
    #[serde(default)]
    pub idx_to_product: BTreeMap<String, String>,
    #[serde(default)]
    pub cb_product_to_idx: BTreeMap<String, usize>,
    #[serde(default)]
    pub cb_idx_to_product: BTreeMap<String, String>,
}

impl MappingsFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Assemble the file from the collaborative and content mappings
    pub fn from_mappings(collaborative: &IdMapping, content: &IdMapping) -> Self {
        let (product_to_idx, idx_to_product) = Self::tables(collaborative);
        let (cb_product_to_idx, cb_idx_to_product) = Self::tables(content);

        Self {
            product_to_idx,
            idx_to_product,
            cb_product_to_idx,
            cb_idx_to_product,
        }
    }

    pub fn collaborative(&self) -> Result<IdMapping> {
        Self::mapping(&self.product_to_idx, &self.idx_to_product)
    }

    pub fn content(&self) -> Result<IdMapping> {
        Self::mapping(&self.cb_product_to_idx, &self.cb_idx_to_product)
    }

    fn tables(mapping: &IdMapping) -> (BTreeMap<String, usize>, BTreeMap<String, String>) {
        let mut forward = BTreeMap::new();
        let mut reverse = BTreeMap::new();
        for (&row, id) in &mapping.to_id {
            forward.insert(id.clone(), row);
            reverse.insert(row.to_string(), id.clone());
        }
        (forward, reverse)
    }

    // The forward table is authoritative; the reverse one is only a fallback.
    fn mapping(
        forward: &BTreeMap<String, usize>,
        reverse: &BTreeMap<String, String>,
    ) -> Result<IdMapping> {
        if !forward.is_empty() {
            return IdMapping::from_pairs(forward.iter().map(|(id, &row)| (id.clone(), row)));
        }

        let mut pairs = Vec::with_capacity(reverse.len());
        for (row, id) in reverse {
            let row: usize = row.parse().map_err(|_| {
                RecommendError::ArtifactError(format!("row key {:?} is not a number", row))
            })?;
            pairs.push((id.clone(), row));
        }
        IdMapping::from_pairs(pairs)
    }
}
