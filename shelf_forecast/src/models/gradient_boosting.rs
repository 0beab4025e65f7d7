//! Gradient-boosted regression trees
//!
//! The artifact stores each tree as a flat node array. Node 0 is the root and
//! a split's children always come after it, so evaluation is a forward walk.

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use serde::{Deserialize, Serialize};

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `features[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// A tree with a single leaf
    pub fn leaf(value: f64) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf { value }],
        }
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ForecastError::ValidationError(
                "Regression tree has no nodes".to_string(),
            ));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(ForecastError::ValidationError(format!(
                            "Node {} splits on feature {} but the model has {} features",
                            index, feature, n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ForecastError::ValidationError(format!(
                            "Node {} has a non-finite threshold",
                            index
                        )));
                    }
                    for child in [left, right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ForecastError::ValidationError(format!(
                                "Node {} points to invalid child {}",
                                index, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ForecastError::ValidationError(format!(
                            "Leaf {} has a non-finite value",
                            index
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walk from the root to a leaf; assumes a validated tree
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[feature] <= threshold { left } else { right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

/// Additive ensemble: `init + learning_rate * sum(tree(x))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub init: f64,
    pub learning_rate: f64,
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    /// Create a validated ensemble
    pub fn new(init: f64, learning_rate: f64, n_features: usize, trees: Vec<RegressionTree>) -> Result<Self> {
        let model = Self {
            init,
            learning_rate,
            n_features,
            trees,
        };
        model.validate()?;
        Ok(model)
    }
}

impl Regressor for GradientBoostingRegressor {
    fn name(&self) -> &str {
        "GradientBoostingRegressor"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn validate(&self) -> Result<()> {
        if !self.init.is_finite() {
            return Err(ForecastError::ValidationError(
                "Initial prediction must be finite".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ForecastError::ValidationError(format!(
                "Learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features).map_err(|e| {
                ForecastError::ValidationError(format!("Tree {}: {}", i, e))
            })?;
        }
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        self.check_width(features)?;

        let boost: f64 = self.trees.iter().map(|tree| tree.evaluate(features)).sum();
        Ok(self.init + self.learning_rate * boost)
    }
}
