//! Cosine similarity over sparse rows

use std::cmp::Ordering;

/// Borrowed view of one sparse row: sorted column indices and their values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRow<'a> {
    pub indices: &'a [u32],
    pub values: &'a [f32],
}

impl<'a> SparseRow<'a> {
    pub fn new(indices: &'a [u32], values: &'a [f32]) -> Self {
        Self { indices, values }
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Euclidean norm of the row
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product with another row. Both rows must have ascending indices.
    pub fn dot(&self, other: &SparseRow<'_>) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;

        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }

        sum
    }
}

/// Cosine similarity of two sparse rows; zero when either row has no mass
pub fn cosine_similarity(a: &SparseRow<'_>, b: &SparseRow<'_>) -> f32 {
    let denom = a.norm() * b.norm();
    if denom <= f32::EPSILON {
        return 0.0;
    }

    (a.dot(b) / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dot_skips_disjoint_columns() {
        let a = SparseRow::new(&[0, 2, 5], &[1.0, 2.0, 3.0]);
        let b = SparseRow::new(&[2, 3, 5], &[4.0, 1.0, 1.0]);
        assert_relative_eq!(a.dot(&b), 11.0);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = SparseRow::new(&[0, 1], &[1.0, 1.0]);
        let b = SparseRow::new(&[0, 1], &[2.0, 2.0]);
        let c = SparseRow::new(&[4], &[1.0]);
        let empty = SparseRow::new(&[], &[]);

        assert_relative_eq!(cosine_similarity(&a, &b), 1.0, epsilon = 1e-6);
        assert_relative_eq!(cosine_similarity(&a, &c), 0.0);
        assert_relative_eq!(cosine_similarity(&a, &empty), 0.0);
    }
}
