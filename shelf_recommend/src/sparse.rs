//! Compressed sparse row matrices, the on-disk form of both similarity indexes

use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};
use shelf_math::SparseRow;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Row-major sparse matrix with `f32` values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    data: Vec<f32>,
}

impl CsrMatrix {
    /// Create a matrix from raw CSR buffers, validating their consistency
    pub fn new(
        rows: usize,
        cols: usize,
        indptr: Vec<usize>,
        indices: Vec<u32>,
        data: Vec<f32>,
    ) -> Result<Self> {
        let matrix = Self {
            rows,
            cols,
            indptr,
            indices,
            data,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Build a matrix from per-row `(column, value)` entries.
    ///
    /// Entries are sorted by column, duplicate columns are summed and explicit
    /// zeros are dropped.
    pub fn from_rows(cols: usize, rows: Vec<Vec<(u32, f32)>>) -> Result<Self> {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for mut row in rows.into_iter() {
            row.sort_by_key(|(col, _)| *col);

            let mut merged: Vec<(u32, f32)> = Vec::with_capacity(row.len());
            for (col, value) in row {
                match merged.last_mut() {
                    Some((last_col, last_value)) if *last_col == col => *last_value += value,
                    _ => merged.push((col, value)),
                }
            }

            for (col, value) in merged {
                if value != 0.0 {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(indices.len());
        }

        let rows = indptr.len() - 1;
        Self::new(rows, cols, indptr, indices, data)
    }

    /// Check the structural invariants of the CSR buffers
    pub fn validate(&self) -> Result<()> {
        if self.indptr.len() != self.rows + 1 {
            return Err(RecommendError::ArtifactError(format!(
                "indptr length ({}) must be rows + 1 ({})",
                self.indptr.len(),
                self.rows + 1
            )));
        }
        if self.indices.len() != self.data.len() {
            return Err(RecommendError::ArtifactError(format!(
                "indices length ({}) doesn't match data length ({})",
                self.indices.len(),
                self.data.len()
            )));
        }
        if self.indptr.first() != Some(&0) || self.indptr.last() != Some(&self.indices.len()) {
            return Err(RecommendError::ArtifactError(
                "indptr must start at 0 and end at the number of stored entries".to_string(),
            ));
        }

        for row in 0..self.rows {
            let (start, end) = (self.indptr[row], self.indptr[row + 1]);
            if start > end || end > self.indices.len() {
                return Err(RecommendError::ArtifactError(format!(
                    "indptr decreases at row {}",
                    row
                )));
            }
            let cols = &self.indices[start..end];
            if cols.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(RecommendError::ArtifactError(format!(
                    "column indices of row {} are not strictly ascending",
                    row
                )));
            }
            if cols.iter().any(|&col| col as usize >= self.cols) {
                return Err(RecommendError::ArtifactError(format!(
                    "row {} references a column beyond {}",
                    row, self.cols
                )));
            }
        }

        Ok(())
    }

    /// Load a matrix from a JSON artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let matrix: CsrMatrix = serde_json::from_reader(BufReader::new(file))?;
        matrix.validate()?;
        Ok(matrix)
    }

    /// Write the matrix as a JSON artifact
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Fraction of cells that are zero
    pub fn sparsity(&self) -> f64 {
        let cells = self.rows as f64 * self.cols as f64;
        if cells == 0.0 {
            return 1.0;
        }
        1.0 - self.nnz() as f64 / cells
    }

    /// Borrow one row
    pub fn row(&self, row: usize) -> Option<SparseRow<'_>> {
        if row >= self.rows {
            return None;
        }
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        Some(SparseRow::new(&self.indices[start..end], &self.data[start..end]))
    }
}
