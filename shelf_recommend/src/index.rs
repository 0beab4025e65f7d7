//! Brute-force cosine nearest-neighbour index over sparse rows
//!
//! Queries walk an inverted (column -> rows) posting list so only rows sharing
//! at least one non-zero column with the query are scored. On >99% sparse
//! interaction data this touches a small fraction of the matrix.

use crate::error::{RecommendError, Result};
use crate::mapping::IdMapping;
use crate::sparse::CsrMatrix;
use shelf_math::SparseRow;
use tracing::warn;

/// A returned row and its cosine distance (`1 - similarity`) from the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f32,
}

impl Neighbor {
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Read-only cosine kNN structure over the rows of a [`CsrMatrix`]
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    matrix: CsrMatrix,
    norms: Vec<f32>,
    postings: Vec<Vec<(u32, f32)>>,
}

impl SimilarityIndex {
    pub fn new(matrix: CsrMatrix) -> Self {
        let mut norms = Vec::with_capacity(matrix.rows());
        let mut postings: Vec<Vec<(u32, f32)>> = vec![Vec::new(); matrix.cols()];

        for row in 0..matrix.rows() {
            let vector = match matrix.row(row) {
                Some(vector) => vector,
                None => break,
            };
            norms.push(vector.norm());
            for (&col, &value) in vector.indices.iter().zip(vector.values) {
                postings[col as usize].push((row as u32, value));
            }
        }

        Self {
            matrix,
            norms,
            postings,
        }
    }

    /// Number of indexed rows
    pub fn len(&self) -> usize {
        self.matrix.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.rows() == 0
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// The `k` rows closest to `query`, nearest first, ties broken by row.
    ///
    /// Rows with no column in common with the query (similarity 0) are never
    /// returned, so fewer than `k` neighbours may come back.
    pub fn kneighbors(&self, query: &SparseRow<'_>, k: usize) -> Vec<Neighbor> {
        let query_norm = query.norm();
        if k == 0 || query_norm <= f32::EPSILON {
            return Vec::new();
        }

        let mut dots = vec![0.0f32; self.len()];
        let mut seen = vec![false; self.len()];
        let mut touched = Vec::new();

        for (&col, &q) in query.indices.iter().zip(query.values) {
            let Some(posting) = self.postings.get(col as usize) else {
                continue;
            };
            for &(row, value) in posting {
                let row = row as usize;
                if !seen[row] {
                    seen[row] = true;
                    touched.push(row);
                }
                dots[row] += q * value;
            }
        }

        let mut neighbors: Vec<Neighbor> = touched
            .into_iter()
            .filter_map(|row| {
                let denom = query_norm * self.norms[row];
                if denom <= f32::EPSILON {
                    return None;
                }
                let similarity = (dots[row] / denom).clamp(-1.0, 1.0);
                (similarity > 0.0).then(|| Neighbor {
                    row,
                    distance: 1.0 - similarity,
                })
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.row.cmp(&b.row)));
        neighbors.truncate(k);
        neighbors
    }

    /// Neighbours of an indexed row; the row itself is included when it has any mass
    pub fn kneighbors_of_row(&self, row: usize, k: usize) -> Result<Vec<Neighbor>> {
        let query = self.matrix.row(row).ok_or_else(|| {
            RecommendError::NotFound(format!("row {} is outside the index", row))
        })?;
        Ok(self.kneighbors(&query, k))
    }
}

/// A similarity index together with the mapping that names its rows
#[derive(Debug, Clone)]
pub struct ProductIndex {
    mapping: IdMapping,
    index: SimilarityIndex,
}

impl ProductIndex {
    /// Pair a mapping with its matrix. Mapping entries pointing past the last
    /// matrix row are dropped so lookups can never name a non-existent row.
    pub fn new(mut mapping: IdMapping, matrix: CsrMatrix) -> Self {
        let dropped = mapping.truncate_rows(matrix.rows());
        if dropped > 0 {
            warn!(
                "Dropped {} mapping entries beyond the {} matrix rows",
                dropped,
                matrix.rows()
            );
        }

        Self {
            mapping,
            index: SimilarityIndex::new(matrix),
        }
    }

    pub fn mapping(&self) -> &IdMapping {
        &self.mapping
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Number of products addressable through this index
    pub fn product_count(&self) -> usize {
        self.mapping.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> CsrMatrix {
        // rows: 0 and 1 overlap heavily, 2 overlaps 1 slightly, 3 is disjoint, 4 is empty
        CsrMatrix::from_rows(
            6,
            vec![
                vec![(0, 1.0), (1, 1.0), (2, 1.0)],
                vec![(0, 1.0), (1, 1.0), (3, 1.0)],
                vec![(3, 1.0), (4, 1.0)],
                vec![(5, 1.0)],
                vec![],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_self_is_nearest() {
        let index = SimilarityIndex::new(matrix());
        let neighbors = index.kneighbors_of_row(0, 10).unwrap();

        assert_eq!(neighbors[0].row, 0);
        assert!(neighbors[0].distance.abs() < 1e-6);
        assert_eq!(neighbors[1].row, 1);
        // row 2 shares nothing with row 0, rows 3 and 4 neither
        assert_eq!(neighbors.len(), 2);
    }

    #[test]
    fn test_ordering_and_truncation() {
        let index = SimilarityIndex::new(matrix());
        let neighbors = index.kneighbors_of_row(1, 2).unwrap();

        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].row, 1);
        assert_eq!(neighbors[1].row, 0);
        assert!(neighbors[0].distance <= neighbors[1].distance);
    }

    #[test]
    fn test_empty_row_has_no_neighbors() {
        let index = SimilarityIndex::new(matrix());
        assert!(index.kneighbors_of_row(4, 3).unwrap().is_empty());
        assert!(index.kneighbors_of_row(9, 3).is_err());
    }

    #[test]
    fn test_product_index_drops_out_of_range_rows() {
        let mapping = IdMapping::from_ordered_ids(
            (0..7).map(|i| format!("P{}", i)),
        )
        .unwrap();
        let index = ProductIndex::new(mapping, matrix());
        assert_eq!(index.product_count(), 5);
        assert!(!index.mapping().contains("P6"));
    }
}
