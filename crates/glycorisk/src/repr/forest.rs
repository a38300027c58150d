//! Forest of decision trees with a single output group.

use ndarray::ArrayView1;

use super::tree::{Tree, TreeValidationError};

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForestValidationError {
    #[error("forest has no trees")]
    NoTrees,
    #[error("base score is not finite")]
    NonFiniteBaseScore,
    #[error("tree {tree_idx}: {error}")]
    InvalidTree {
        tree_idx: usize,
        error: TreeValidationError,
    },
}

/// Additive tree ensemble producing one raw margin per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    base_score: f64,
}

impl Forest {
    /// Create an empty forest with the given base score.
    pub fn new(base_score: f64) -> Self {
        Self {
            trees: Vec::new(),
            base_score,
        }
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Builder-style [`push_tree`](Self::push_tree).
    pub fn with_tree(mut self, tree: Tree) -> Self {
        self.push_tree(tree);
        self
    }

    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Validate the forest against a declared input width.
    pub fn validate(&self, n_features: usize) -> Result<(), ForestValidationError> {
        if self.trees.is_empty() {
            return Err(ForestValidationError::NoTrees);
        }
        if !self.base_score.is_finite() {
            return Err(ForestValidationError::NonFiniteBaseScore);
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate_features(n_features)
                .map_err(|error| ForestValidationError::InvalidTree { tree_idx, error })?;
        }
        Ok(())
    }

    /// Multiply every leaf and the base score by `factor`.
    ///
    /// Folds a sigmoid slope into the ensemble so a unit sigmoid applies.
    pub(crate) fn scale(&mut self, factor: f64) {
        self.base_score *= factor;
        for tree in &mut self.trees {
            tree.scale_leaves(factor);
        }
    }

    /// Raw margin for a single row: `base_score + Σ leaf`.
    pub fn predict_row(&self, features: ArrayView1<'_, f64>) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.predict_row(features))
    }
}
