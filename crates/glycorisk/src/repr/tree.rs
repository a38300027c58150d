//! Immutable SoA decision tree.
//!
//! Nodes are stored in parallel arrays indexed by [`NodeId`]. A node is a leaf
//! when both of its child entries are [`NO_CHILD`]. Only numeric splits are
//! represented; categorical and linear-leaf models are rejected at load time.

use ndarray::ArrayView1;

use super::node::{goes_left, NodeId, NO_CHILD};

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,
    /// A per-node array does not have one entry per node.
    #[error("{field} has {len} entries for {n_nodes} nodes")]
    ArrayLenMismatch {
        field: &'static str,
        len: usize,
        n_nodes: usize,
    },
    /// Exactly one child of a node is set.
    #[error("node {node} has only one child")]
    HalfLeaf { node: NodeId },
    /// A child pointer references an out-of-bounds node.
    #[error("node {node}: {side} child {child} out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node was reached twice (shared subtree or cycle).
    #[error("node {node} is reachable by more than one path")]
    DuplicateVisit { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
    /// A split references a feature beyond the model's input width.
    #[error("node {node} splits on feature {feature}, model has {n_features}")]
    FeatureOutOfRange {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },
    /// A leaf value or split threshold is NaN.
    #[error("node {node} has a NaN {field}")]
    NanValue { node: NodeId, field: &'static str },
}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_indices: Box<[u32]>,
    thresholds: Box<[f64]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    default_left: Box<[bool]>,
    leaf_values: Box<[f64]>,
}

impl Tree {
    /// Create and validate a tree from parallel per-node arrays.
    pub fn new(
        split_indices: Vec<u32>,
        thresholds: Vec<f64>,
        left_children: Vec<NodeId>,
        right_children: Vec<NodeId>,
        default_left: Vec<bool>,
        leaf_values: Vec<f64>,
    ) -> Result<Self, TreeValidationError> {
        let n_nodes = leaf_values.len();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        for (field, len) in [
            ("split_indices", split_indices.len()),
            ("thresholds", thresholds.len()),
            ("children_left", left_children.len()),
            ("children_right", right_children.len()),
            ("default_left", default_left.len()),
        ] {
            if len != n_nodes {
                return Err(TreeValidationError::ArrayLenMismatch {
                    field,
                    len,
                    n_nodes,
                });
            }
        }

        let tree = Self {
            split_indices: split_indices.into_boxed_slice(),
            thresholds: thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
        };
        tree.validate()?;
        Ok(tree)
    }

    /// A single-leaf tree.
    pub fn leaf(value: f64) -> Self {
        Self {
            split_indices: Box::new([0]),
            thresholds: Box::new([0.0]),
            left_children: Box::new([NO_CHILD]),
            right_children: Box::new([NO_CHILD]),
            default_left: Box::new([false]),
            leaf_values: Box::new([value]),
        }
    }

    /// A depth-1 tree splitting `feature` at `threshold`.
    pub fn stump(feature: u32, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            split_indices: Box::new([feature, 0, 0]),
            thresholds: Box::new([threshold, 0.0, 0.0]),
            left_children: Box::new([1, NO_CHILD, NO_CHILD]),
            right_children: Box::new([2, NO_CHILD, NO_CHILD]),
            default_left: Box::new([true, false, false]),
            leaf_values: Box::new([0.0, left, right]),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of nodes (internal + leaves).
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.leaf_values.len()
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        let i = node as usize;
        self.left_children[i] == NO_CHILD && self.right_children[i] == NO_CHILD
    }

    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    pub fn threshold(&self, node: NodeId) -> f64 {
        self.thresholds[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }

    /// Multiply every leaf value by `factor`.
    pub(crate) fn scale_leaves(&mut self, factor: f64) {
        for v in self.leaf_values.iter_mut() {
            *v *= factor;
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check that every node is reachable from the root exactly once and that
    /// child pointers stay in bounds.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        let mut seen = vec![false; n_nodes];
        let mut stack: Vec<NodeId> = vec![0];

        while let Some(node) = stack.pop() {
            let idx = node as usize;
            if seen[idx] {
                return Err(TreeValidationError::DuplicateVisit { node });
            }
            seen[idx] = true;

            let left = self.left_children[idx];
            let right = self.right_children[idx];
            match (left == NO_CHILD, right == NO_CHILD) {
                (true, true) => {
                    if self.leaf_values[idx].is_nan() {
                        return Err(TreeValidationError::NanValue {
                            node,
                            field: "leaf value",
                        });
                    }
                }
                (false, false) => {
                    if self.thresholds[idx].is_nan() {
                        return Err(TreeValidationError::NanValue {
                            node,
                            field: "threshold",
                        });
                    }
                    for (side, child) in [("left", left), ("right", right)] {
                        if child as usize >= n_nodes {
                            return Err(TreeValidationError::ChildOutOfBounds {
                                node,
                                side,
                                child,
                                n_nodes,
                            });
                        }
                    }
                    stack.push(right);
                    stack.push(left);
                }
                _ => return Err(TreeValidationError::HalfLeaf { node }),
            }
        }

        match seen.iter().position(|&s| !s) {
            Some(i) => Err(TreeValidationError::UnreachableNode { node: i as NodeId }),
            None => Ok(()),
        }
    }

    /// Check that all splits reference features below `n_features`.
    pub fn validate_features(&self, n_features: usize) -> Result<(), TreeValidationError> {
        for node in 0..self.n_nodes() as NodeId {
            if self.is_leaf(node) {
                continue;
            }
            let feature = self.split_index(node);
            if feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfRange {
                    node,
                    feature,
                    n_features,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Traverse from the root to the leaf reached by `features`.
    ///
    /// Features beyond the row width are treated as missing.
    #[inline]
    pub fn traverse_to_leaf(&self, features: ArrayView1<'_, f64>) -> NodeId {
        let mut node: NodeId = 0;
        while !self.is_leaf(node) {
            let fvalue = features
                .get(self.split_index(node) as usize)
                .copied()
                .unwrap_or(f64::NAN);
            node = if goes_left(fvalue, self.threshold(node), self.default_left(node)) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }
        node
    }

    /// Leaf value for a single row.
    #[inline]
    pub fn predict_row(&self, features: ArrayView1<'_, f64>) -> f64 {
        self.leaf_value(self.traverse_to_leaf(features))
    }
}
