//! Binary item x user interaction matrix, the input of the collaborative index

use crate::error::{RecommendError, Result};
use crate::mapping::IdMapping;
use crate::sparse::CsrMatrix;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Item x user matrix restricted to products above the cold-start threshold
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    products: IdMapping,
    user_count: usize,
    matrix: CsrMatrix,
}

impl InteractionMatrix {
    /// Build the matrix from `(user_id, product_id)` interaction records.
    ///
    /// Products with fewer than `min_interactions` records are dropped. Rows
    /// are assigned in ascending product id order and columns in ascending
    /// user id order, so the result is a pure function of the record set.
    /// Repeat interactions of one user with one product collapse to a single 1.
    pub fn build<'a, I>(records: I, min_interactions: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if min_interactions == 0 {
            return Err(RecommendError::InvalidArgument(
                "min_interactions must be at least 1".to_string(),
            ));
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut by_product: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for (user, product) in records {
            *counts.entry(product).or_insert(0) += 1;
            by_product.entry(product).or_default().insert(user);
        }

        by_product.retain(|product, _| counts[product] >= min_interactions);

        let users: BTreeSet<&str> = by_product.values().flatten().copied().collect();
        let user_cols: BTreeMap<&str, u32> = users
            .iter()
            .enumerate()
            .map(|(col, user)| (*user, col as u32))
            .collect();

        let rows: Vec<Vec<(u32, f32)>> = by_product
            .values()
            .map(|users| users.iter().map(|u| (user_cols[u], 1.0)).collect())
            .collect();

        let products = IdMapping::from_ordered_ids(by_product.keys().map(|p| p.to_string()))?;
        let matrix = CsrMatrix::from_rows(users.len(), rows)?;

        info!(
            "Built interaction matrix: {} products x {} users, sparsity {:.4}",
            matrix.rows(),
            matrix.cols(),
            matrix.sparsity()
        );

        Ok(Self {
            products,
            user_count: users.len(),
            matrix,
        })
    }

    pub fn products(&self) -> &IdMapping {
        &self.products
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn user_count(&self) -> usize {
        self.user_count
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    pub fn sparsity(&self) -> f64 {
        self.matrix.sparsity()
    }

    pub fn into_parts(self) -> (IdMapping, CsrMatrix) {
        (self.products, self.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_threshold() {
        let records = vec![
            ("u1", "B"),
            ("u2", "B"),
            ("u1", "A"),
            ("u3", "A"),
            ("u3", "C"),
        ];
        let built = InteractionMatrix::build(records, 2).unwrap();

        assert_eq!(built.product_count(), 2);
        assert_eq!(built.products().row("A"), Some(0));
        assert_eq!(built.products().row("B"), Some(1));
        assert!(!built.products().contains("C"));
        // users of kept products only: u1, u2, u3
        assert_eq!(built.user_count(), 3);
        assert_eq!(built.matrix().row(0).unwrap().indices, &[0, 2]);
    }

    #[test]
    fn test_repeat_interactions_are_binary() {
        let records = vec![("u1", "A"), ("u1", "A"), ("u2", "A")];
        let built = InteractionMatrix::build(records, 1).unwrap();
        assert_eq!(built.matrix().row(0).unwrap().values, &[1.0, 1.0]);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(InteractionMatrix::build(Vec::<(&str, &str)>::new(), 0).is_err());
    }
}
