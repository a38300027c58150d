//! Conversion from parsed LightGBM models to [`GbdtClassifier`].

use crate::model::{GbdtClassifier, OutputTransform};
use crate::repr::{Forest, ForestValidationError, NodeId, Tree, TreeValidationError, NO_CHILD};

use super::text::{DecisionType, LgbModel, LgbObjective, LgbTree, MissingType};

/// Error type for LightGBM model conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("objective is missing from the model header")]
    MissingObjective,
    #[error("unsupported objective {0:?}")]
    UnsupportedObjective(String),
    #[error("multiclass models are not supported ({num_class} classes)")]
    Multiclass { num_class: usize },
    #[error("tree {tree}: linear trees are not supported")]
    LinearTree { tree: usize },
    #[error("tree {tree}: categorical split at node {node} is not supported")]
    CategoricalSplit { tree: usize, node: usize },
    #[error("tree {tree}: zero-as-missing split at node {node} is not supported")]
    ZeroAsMissing { tree: usize, node: usize },
    #[error("tree {tree}: invalid child index {child} at node {node}")]
    InvalidChildIndex { tree: usize, node: usize, child: i32 },
    #[error("tree {tree}: invalid split feature {feature} at node {node}")]
    InvalidFeature { tree: usize, node: usize, feature: i32 },
    #[error("tree {tree}: {source}")]
    InvalidTree {
        tree: usize,
        #[source]
        source: TreeValidationError,
    },
    #[error(transparent)]
    InvalidForest(#[from] ForestValidationError),
}

impl LgbModel {
    /// Convert to a binary classifier.
    ///
    /// `binary` objectives yield sigmoid probabilities with the sigmoid slope
    /// folded into the leaves; `regression` objectives yield the raw score as
    /// a direct label.
    pub fn to_classifier(&self) -> Result<GbdtClassifier, ConversionError> {
        let (transform, slope) = match &self.header.objective {
            None => return Err(ConversionError::MissingObjective),
            Some(LgbObjective::Binary { sigmoid }) => (OutputTransform::Sigmoid, *sigmoid),
            Some(LgbObjective::Regression) => (OutputTransform::Identity, 1.0),
            Some(LgbObjective::Multiclass { num_class }) => {
                return Err(ConversionError::Multiclass {
                    num_class: *num_class,
                })
            }
            Some(LgbObjective::Unknown(name)) => {
                return Err(ConversionError::UnsupportedObjective(name.clone()))
            }
        };
        if self.header.num_tree_per_iteration > 1 || self.header.num_class > 1 {
            return Err(ConversionError::Multiclass {
                num_class: self.header.num_class.max(self.header.num_tree_per_iteration),
            });
        }

        let mut forest = Forest::new(0.0);
        for (idx, lgb_tree) in self.trees.iter().enumerate() {
            forest.push_tree(convert_tree(lgb_tree, idx)?);
        }

        // Random-forest mode averages raw scores before the link.
        let mut factor = slope;
        if self.header.average_output {
            factor /= self.trees.len() as f64;
        }
        if factor != 1.0 {
            forest.scale(factor);
        }

        let classifier = GbdtClassifier::new(forest, transform, self.num_features())?;
        Ok(if self.header.feature_names.is_empty() {
            classifier
        } else {
            classifier.with_feature_names(self.header.feature_names.clone())
        })
    }
}

/// Convert a single tree.
///
/// Internal nodes keep their LightGBM index; leaf `k` becomes node
/// `num_internal + k`.
fn convert_tree(lgb_tree: &LgbTree, tree: usize) -> Result<Tree, ConversionError> {
    if lgb_tree.is_linear {
        return Err(ConversionError::LinearTree { tree });
    }
    if lgb_tree.num_leaves <= 1 {
        let value = lgb_tree.leaf_value.first().copied().unwrap_or(0.0);
        return Ok(Tree::leaf(value));
    }

    let num_internal = lgb_tree.num_internal();
    let total = num_internal + lgb_tree.num_leaves;
    let mut split_indices = vec![0u32; total];
    let mut thresholds = vec![0.0; total];
    let mut left = vec![NO_CHILD; total];
    let mut right = vec![NO_CHILD; total];
    let mut default_left = vec![false; total];
    let mut leaf_values = vec![0.0; total];

    for node in 0..num_internal {
        let dt = DecisionType::from_i8(lgb_tree.decision_type[node]);
        if dt.is_categorical {
            return Err(ConversionError::CategoricalSplit { tree, node });
        }
        let threshold = lgb_tree.threshold[node];
        default_left[node] = match dt.missing_type {
            MissingType::NaN => dt.default_left,
            // NaN is compared as 0.0.
            MissingType::None => 0.0 <= threshold,
            MissingType::Zero => return Err(ConversionError::ZeroAsMissing { tree, node }),
        };

        let feature = lgb_tree.split_feature[node];
        split_indices[node] = u32::try_from(feature)
            .map_err(|_| ConversionError::InvalidFeature { tree, node, feature })?;
        // `value <= t` is `value < next_up(t)`.
        thresholds[node] = next_up(threshold);
        left[node] = child_ref(lgb_tree.left_child[node], lgb_tree, tree, node)?;
        right[node] = child_ref(lgb_tree.right_child[node], lgb_tree, tree, node)?;
    }
    for (k, &value) in lgb_tree.leaf_value.iter().enumerate() {
        leaf_values[num_internal + k] = value;
    }

    Tree::new(split_indices, thresholds, left, right, default_left, leaf_values)
        .map_err(|source| ConversionError::InvalidTree { tree, source })
}

/// Map a LightGBM child pointer (negative `!k` for leaf `k`) to a node id.
fn child_ref(
    child: i32,
    lgb_tree: &LgbTree,
    tree: usize,
    node: usize,
) -> Result<NodeId, ConversionError> {
    let num_internal = lgb_tree.num_internal();
    let resolved = if child < 0 {
        let leaf = (!child) as usize;
        (leaf < lgb_tree.num_leaves).then_some(num_internal + leaf)
    } else {
        let internal = child as usize;
        (internal > 0 && internal < num_internal).then_some(internal)
    };
    resolved
        .and_then(|idx| NodeId::try_from(idx).ok())
        .ok_or(ConversionError::InvalidChildIndex { tree, node, child })
}

/// Smallest `f64` strictly greater than `x`.
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classifier, ClassifierOutput};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn model(objective: &str, decision_type: &str) -> LgbModel {
        let text = format!(
            "tree
version=v4
num_class=1
num_tree_per_iteration=1
max_feature_idx=1
objective={objective}

Tree=0
num_leaves=3
split_feature=0 1
threshold=0.5 2
decision_type={decision_type}
left_child=-1 -2
right_child=1 -3
leaf_value=-1 0.5 2
is_linear=0

end of trees
"
        );
        LgbModel::from_string(&text).unwrap()
    }

    fn margin(out: ClassifierOutput, slope: f64) -> f64 {
        match out {
            ClassifierOutput::Probabilities(p) => (p[1] / p[0]).ln() / slope,
            ClassifierOutput::Label(v) => v,
        }
    }

    #[test]
    fn next_up_is_strictly_greater() {
        for x in [-1.5, -0.0, 0.0, 1e-300, 0.5, 1e300] {
            let y = next_up(x);
            assert!(y > x);
        }
        assert_eq!(next_up(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn threshold_boundary_goes_left() {
        let clf = model("regression", "2 2").to_classifier().unwrap();
        // feature 0 == 0.5 satisfies `<=` and reaches leaf 0
        let out = clf.classify(array![0.5, 0.0].view()).unwrap();
        assert_eq!(out, ClassifierOutput::Label(-1.0));
        let out = clf.classify(array![0.6, 2.0].view()).unwrap();
        assert_eq!(out, ClassifierOutput::Label(0.5));
        let out = clf.classify(array![0.6, 2.1].view()).unwrap();
        assert_eq!(out, ClassifierOutput::Label(2.0));
    }

    #[test]
    fn sigmoid_slope_is_folded() {
        let clf = model("binary sigmoid:2", "2 2").to_classifier().unwrap();
        let out = clf.classify(array![0.0, 0.0].view()).unwrap();
        // raw score -1, probability uses 2 * raw
        assert_abs_diff_eq!(margin(out, 1.0), -2.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_type_none_sends_nan_as_zero() {
        // threshold 0.5 >= 0 so NaN goes left even though default_left bit is unset
        let clf = model("regression", "0 0").to_classifier().unwrap();
        let out = clf.classify(array![f64::NAN, 0.0].view()).unwrap();
        assert_eq!(out, ClassifierOutput::Label(-1.0));
    }

    #[test]
    fn missing_type_nan_uses_default_bit() {
        // decision_type 8: NaN missing, default right
        let clf = model("regression", "8 8").to_classifier().unwrap();
        let out = clf.classify(array![f64::NAN, f64::NAN].view()).unwrap();
        assert_eq!(out, ClassifierOutput::Label(2.0));
    }

    #[test]
    fn unsupported_constructs() {
        assert!(matches!(
            model("regression", "1 0").to_classifier(),
            Err(ConversionError::CategoricalSplit { tree: 0, node: 0 })
        ));
        assert!(matches!(
            model("regression", "0 4").to_classifier(),
            Err(ConversionError::ZeroAsMissing { tree: 0, node: 1 })
        ));
        assert!(matches!(
            model("multiclass num_class:3", "0 0").to_classifier(),
            Err(ConversionError::Multiclass { num_class: 3 })
        ));
        assert!(matches!(
            model("lambdarank", "0 0").to_classifier(),
            Err(ConversionError::UnsupportedObjective(_))
        ));
    }

    #[test]
    fn feature_names_are_carried() {
        let mut lgb = model("binary sigmoid:1", "2 2");
        lgb.header.feature_names = vec!["HighBP".into(), "BMI".into()];
        let clf = lgb.to_classifier().unwrap();
        assert_eq!(clf.feature_names(), Some(&["HighBP".to_string(), "BMI".to_string()][..]));
    }
}
