//! Conversion from schema types to runtime types.
//!
//! Runtime -> schema conversions are provided for the types fixtures write
//! back out; schema -> runtime conversions validate as they go.

use std::sync::Arc;

use ndarray::Array1;

use super::error::ArtifactError;
use super::schema::{
    ClassifierSchema, ConstantSchema, ForestSchema, GbdtSchema, LogisticSchema,
    OutputTransformSchema, PolySchema, ScalerSchema, SelectorSchema, TreeSchema,
};
use crate::model::{
    Classifier, ConstantClassifier, GbdtClassifier, LogisticClassifier, OutputTransform,
};
use crate::preprocess::{FeatureSelector, PolyError, PolynomialExpander, Scaler, ScalerError};
use crate::repr::{Forest, ForestValidationError, Tree, TreeValidationError};

// =============================================================================
// Output transform
// =============================================================================

impl From<OutputTransformSchema> for OutputTransform {
    fn from(schema: OutputTransformSchema) -> Self {
        match schema {
            OutputTransformSchema::Sigmoid => Self::Sigmoid,
            OutputTransformSchema::Identity => Self::Identity,
        }
    }
}

impl From<OutputTransform> for OutputTransformSchema {
    fn from(transform: OutputTransform) -> Self {
        match transform {
            OutputTransform::Sigmoid => Self::Sigmoid,
            OutputTransform::Identity => Self::Identity,
        }
    }
}

// =============================================================================
// Tree / Forest
// =============================================================================

impl TryFrom<TreeSchema> for Tree {
    type Error = TreeValidationError;

    fn try_from(schema: TreeSchema) -> Result<Self, Self::Error> {
        Tree::new(
            schema.split_indices,
            schema.thresholds,
            schema.children_left,
            schema.children_right,
            schema.default_left,
            schema.leaf_values,
        )
    }
}

impl From<&Tree> for TreeSchema {
    fn from(tree: &Tree) -> Self {
        let nodes = 0..tree.n_nodes() as u32;
        Self {
            split_indices: nodes.clone().map(|n| tree.split_index(n)).collect(),
            thresholds: nodes.clone().map(|n| tree.threshold(n)).collect(),
            children_left: nodes.clone().map(|n| tree.left_child(n)).collect(),
            children_right: nodes.clone().map(|n| tree.right_child(n)).collect(),
            default_left: nodes.clone().map(|n| tree.default_left(n)).collect(),
            leaf_values: nodes.map(|n| tree.leaf_value(n)).collect(),
        }
    }
}

impl TryFrom<ForestSchema> for Forest {
    type Error = ForestValidationError;

    fn try_from(schema: ForestSchema) -> Result<Self, Self::Error> {
        let mut forest = Forest::new(schema.base_score);
        for (tree_idx, tree) in schema.trees.into_iter().enumerate() {
            let tree = Tree::try_from(tree)
                .map_err(|error| ForestValidationError::InvalidTree { tree_idx, error })?;
            forest.push_tree(tree);
        }
        Ok(forest)
    }
}

impl From<&Forest> for ForestSchema {
    fn from(forest: &Forest) -> Self {
        Self {
            trees: forest.trees().map(TreeSchema::from).collect(),
            base_score: forest.base_score(),
        }
    }
}

// =============================================================================
// Classifiers
// =============================================================================

impl TryFrom<GbdtSchema> for GbdtClassifier {
    type Error = ArtifactError;

    fn try_from(schema: GbdtSchema) -> Result<Self, Self::Error> {
        if schema.num_features == 0 {
            return Err(ArtifactError::invalid("gbdt classifier", "num_features is 0"));
        }
        let forest = Forest::try_from(schema.forest)?;
        let classifier =
            GbdtClassifier::new(forest, schema.output_transform.into(), schema.num_features)?;
        Ok(match schema.feature_names {
            Some(names) => classifier.with_feature_names(names),
            None => classifier,
        })
    }
}

impl From<&GbdtClassifier> for GbdtSchema {
    fn from(classifier: &GbdtClassifier) -> Self {
        Self {
            num_features: classifier.n_features().unwrap_or_default(),
            feature_names: classifier.feature_names().map(<[String]>::to_vec),
            forest: classifier.forest().into(),
            output_transform: classifier.transform().into(),
        }
    }
}

impl TryFrom<LogisticSchema> for LogisticClassifier {
    type Error = ArtifactError;

    fn try_from(schema: LogisticSchema) -> Result<Self, Self::Error> {
        if schema.weights.is_empty() {
            return Err(ArtifactError::invalid("logistic classifier", "no weights"));
        }
        if !schema.bias.is_finite() || schema.weights.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::invalid(
                "logistic classifier",
                "non-finite parameter",
            ));
        }
        let classifier = LogisticClassifier::new(Array1::from_vec(schema.weights), schema.bias);
        Ok(match schema.feature_names {
            Some(names) => classifier.with_feature_names(names),
            None => classifier,
        })
    }
}

impl TryFrom<ConstantSchema> for ConstantClassifier {
    type Error = ArtifactError;

    fn try_from(schema: ConstantSchema) -> Result<Self, Self::Error> {
        const COMPONENT: &str = "constant classifier";
        let classifier = match (schema.probabilities, schema.label) {
            (Some(p), None) => {
                if p.is_empty() {
                    return Err(ArtifactError::invalid(COMPONENT, "empty probabilities"));
                }
                if p.iter().any(|v| !v.is_finite() || !(0.0..=1.0).contains(v)) {
                    return Err(ArtifactError::invalid(
                        COMPONENT,
                        "probabilities must lie in [0, 1]",
                    ));
                }
                ConstantClassifier::probabilities(p)
            }
            (None, Some(label)) if label.is_finite() => ConstantClassifier::label(label),
            (None, Some(_)) => return Err(ArtifactError::invalid(COMPONENT, "label is not finite")),
            _ => {
                return Err(ArtifactError::invalid(
                    COMPONENT,
                    "exactly one of probabilities and label is required",
                ))
            }
        };
        Ok(match schema.n_features {
            Some(n) => classifier.with_n_features(n),
            None => classifier,
        })
    }
}

impl ClassifierSchema {
    /// Validate and convert into a shareable classifier.
    pub fn into_classifier(self) -> Result<Arc<dyn Classifier>, ArtifactError> {
        Ok(match self {
            Self::Gbdt(s) => Arc::new(GbdtClassifier::try_from(s)?),
            Self::Logistic(s) => Arc::new(LogisticClassifier::try_from(s)?),
            Self::Constant(s) => Arc::new(ConstantClassifier::try_from(s)?),
        })
    }
}

// =============================================================================
// Preprocessing stages
// =============================================================================

impl TryFrom<PolySchema> for PolynomialExpander {
    type Error = PolyError;

    fn try_from(schema: PolySchema) -> Result<Self, Self::Error> {
        match schema.powers {
            Some(powers) => PolynomialExpander::from_powers(schema.n_features_in, &powers),
            None => PolynomialExpander::new(
                schema.n_features_in,
                schema.degree,
                schema.interaction_only,
                schema.include_bias,
            ),
        }
    }
}

impl TryFrom<SelectorSchema> for FeatureSelector {
    type Error = ArtifactError;

    fn try_from(schema: SelectorSchema) -> Result<Self, Self::Error> {
        let selector = match (schema.support, schema.indices) {
            (Some(support), None) => FeatureSelector::from_support(&support, schema.n_features_in)?,
            (None, Some(indices)) => FeatureSelector::from_indices(indices, schema.n_features_in)?,
            _ => {
                return Err(ArtifactError::invalid(
                    "feature selector",
                    "exactly one of support and indices is required",
                ))
            }
        };
        Ok(selector)
    }
}

impl TryFrom<ScalerSchema> for Scaler {
    type Error = ScalerError;

    fn try_from(schema: ScalerSchema) -> Result<Self, Self::Error> {
        Scaler::new(schema.mean, schema.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn stump_schema() -> TreeSchema {
        TreeSchema {
            split_indices: vec![0, 0, 0],
            thresholds: vec![0.5, 0.0, 0.0],
            children_left: vec![1, 0, 0],
            children_right: vec![2, 0, 0],
            default_left: vec![true, false, false],
            leaf_values: vec![0.0, -1.0, 1.0],
        }
    }

    #[test]
    fn tree_schema_converts() {
        let tree = Tree::try_from(stump_schema()).unwrap();
        assert_eq!(tree, Tree::stump(0, 0.5, -1.0, 1.0));
        assert_eq!(TreeSchema::from(&tree), stump_schema());
    }

    #[test]
    fn ragged_tree_rejected() {
        let mut schema = stump_schema();
        schema.leaf_values.pop();
        assert!(Tree::try_from(schema).is_err());
    }

    #[test]
    fn forest_reports_tree_index() {
        let mut bad = stump_schema();
        bad.children_left[0] = 7;
        let schema = ForestSchema {
            trees: vec![stump_schema(), bad],
            base_score: 0.0,
        };
        assert!(matches!(
            Forest::try_from(schema),
            Err(ForestValidationError::InvalidTree { tree_idx: 1, .. })
        ));
    }

    #[test]
    fn gbdt_feature_width_checked() {
        let schema = GbdtSchema {
            num_features: 1,
            feature_names: None,
            forest: ForestSchema {
                trees: vec![TreeSchema {
                    split_indices: vec![3, 0, 0],
                    ..stump_schema()
                }],
                base_score: 0.0,
            },
            output_transform: OutputTransformSchema::Sigmoid,
        };
        assert!(matches!(
            GbdtClassifier::try_from(schema),
            Err(ArtifactError::Forest(_))
        ));
    }

    #[test]
    fn gbdt_schema_round_trips_through_runtime() {
        let schema = GbdtSchema {
            num_features: 2,
            feature_names: Some(vec!["a".into(), "b".into()]),
            forest: ForestSchema {
                trees: vec![stump_schema()],
                base_score: 0.25,
            },
            output_transform: OutputTransformSchema::Identity,
        };
        let classifier = GbdtClassifier::try_from(schema.clone()).unwrap();
        assert_eq!(GbdtSchema::from(&classifier), schema);
    }

    #[test]
    fn constant_requires_one_output() {
        assert!(ConstantClassifier::try_from(ConstantSchema::default()).is_err());
        assert!(ConstantClassifier::try_from(ConstantSchema {
            probabilities: Some(vec![0.5, 0.5]),
            label: Some(1.0),
            n_features: None,
        })
        .is_err());
        assert!(ConstantClassifier::try_from(ConstantSchema {
            probabilities: Some(vec![1.5, -0.5]),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn logistic_rejects_empty_weights() {
        let schema: LogisticSchema = serde_json::from_value(json!({"weights": []})).unwrap();
        assert!(LogisticClassifier::try_from(schema).is_err());
    }

    #[test]
    fn classifier_schema_dispatch() {
        let schema: ClassifierSchema = serde_json::from_value(json!({
            "type": "logistic",
            "weights": [1.0, -1.0],
            "bias": 0.0
        }))
        .unwrap();
        let classifier = schema.into_classifier().unwrap();
        assert_eq!(classifier.kind(), "logistic");
        assert_eq!(classifier.n_features(), Some(2));
        assert!(classifier.classify(array![1.0, 1.0].view()).is_ok());
    }

    #[test]
    fn selector_needs_exactly_one_source() {
        assert!(FeatureSelector::try_from(SelectorSchema::default()).is_err());
        let both = SelectorSchema {
            n_features_in: None,
            support: Some(vec![true]),
            indices: Some(vec![0]),
        };
        assert!(FeatureSelector::try_from(both).is_err());
    }

    #[test]
    fn poly_powers_take_precedence() {
        let schema = PolySchema {
            n_features_in: 2,
            degree: 2,
            interaction_only: true,
            include_bias: false,
            powers: Some(vec![vec![1, 1]]),
        };
        let poly = PolynomialExpander::try_from(schema).unwrap();
        assert_eq!(poly.n_terms(), 1);
    }
}
