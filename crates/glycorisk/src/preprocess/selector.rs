//! Fixed-subset feature selection.

use ndarray::{Array1, ArrayView1};

use super::Transform;
use crate::error::InferenceError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("selector keeps no features")]
    Empty,
    #[error("selected index {index} is out of range for {n_features_in} inputs")]
    IndexOutOfRange { index: usize, n_features_in: usize },
    #[error("support mask has {len} entries, expected {n_features_in}")]
    MaskLenMismatch { len: usize, n_features_in: usize },
}

/// Keeps a fixed list of input columns, in the stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSelector {
    indices: Vec<usize>,
    n_features_in: Option<usize>,
}

impl FeatureSelector {
    /// Select by explicit indices.
    pub fn from_indices(
        indices: Vec<usize>,
        n_features_in: Option<usize>,
    ) -> Result<Self, SelectorError> {
        if indices.is_empty() {
            return Err(SelectorError::Empty);
        }
        if let Some(n) = n_features_in {
            if let Some(&index) = indices.iter().find(|&&i| i >= n) {
                return Err(SelectorError::IndexOutOfRange {
                    index,
                    n_features_in: n,
                });
            }
        }
        Ok(Self {
            indices,
            n_features_in,
        })
    }

    /// Select by boolean support mask; kept features stay in input order.
    pub fn from_support(
        support: &[bool],
        n_features_in: Option<usize>,
    ) -> Result<Self, SelectorError> {
        if let Some(n) = n_features_in {
            if support.len() != n {
                return Err(SelectorError::MaskLenMismatch {
                    len: support.len(),
                    n_features_in: n,
                });
            }
        }
        let indices = support
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        Self::from_indices(indices, Some(support.len()))
    }
}

impl Transform for FeatureSelector {
    fn name(&self) -> &'static str {
        "feature selector"
    }

    fn n_features_in(&self) -> Option<usize> {
        self.n_features_in
    }

    /// Without a declared width the largest index sets the minimum.
    fn min_features_in(&self) -> Option<usize> {
        self.n_features_in.or_else(|| self.indices.iter().max().map(|&m| m + 1))
    }

    fn n_features_out(&self) -> Option<usize> {
        Some(self.indices.len())
    }

    fn transform(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        match (self.n_features_in, self.min_features_in()) {
            (Some(n), _) => InferenceError::check_width(self.name(), n, row.len())?,
            (None, Some(needed)) if row.len() < needed => {
                return Err(InferenceError::ShapeMismatch {
                    stage: self.name(),
                    expected: needed,
                    actual: row.len(),
                });
            }
            (None, _) => {}
        }
        Ok(self.indices.iter().map(|&i| row[i]).collect())
    }
}
