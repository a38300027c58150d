//! Schema types for model artifacts.
//!
//! These mirror the JSON written by the training job. They are kept separate
//! from runtime types so that artifact layout can change without touching the
//! inference code; [`super::convert`] validates and converts between them.

use serde::{Deserialize, Serialize};

// =============================================================================
// Classifiers
// =============================================================================

/// A classifier object, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSchema {
    Gbdt(GbdtSchema),
    Logistic(LogisticSchema),
    Constant(ConstantSchema),
}

/// Output transform for tree models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTransformSchema {
    #[default]
    Sigmoid,
    Identity,
}

/// Tree ensemble classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtSchema {
    pub num_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub forest: ForestSchema,
    #[serde(default)]
    pub output_transform: OutputTransformSchema,
}

/// Forest schema (collection of trees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSchema {
    /// Trees in boosting order.
    pub trees: Vec<TreeSchema>,
    #[serde(default)]
    pub base_score: f64,
}

/// Tree schema (SoA layout).
///
/// A node whose two children are both 0 is a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSchema {
    pub split_indices: Vec<u32>,
    pub thresholds: Vec<f64>,
    pub children_left: Vec<u32>,
    pub children_right: Vec<u32>,
    pub default_left: Vec<bool>,
    pub leaf_values: Vec<f64>,
}

/// Logistic regression classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticSchema {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

/// Constant classifier; exactly one of `probabilities` and `label`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstantSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
}

// =============================================================================
// Preprocessing stages
// =============================================================================

fn default_degree() -> usize {
    2
}

fn default_true() -> bool {
    true
}

/// Polynomial expander.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolySchema {
    pub n_features_in: usize,
    #[serde(default = "default_degree")]
    pub degree: usize,
    #[serde(default = "default_true")]
    pub interaction_only: bool,
    #[serde(default)]
    pub include_bias: bool,
    /// Explicit exponent matrix; overrides the generated term order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powers: Option<Vec<Vec<u32>>>,
}

/// Feature selector; exactly one of `support` and `indices`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectorSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features_in: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<usize>>,
}

/// Standard scaler.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScalerSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
}

// =============================================================================
// Bundles
// =============================================================================

/// Primary artifact holding the classifier and its stages together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSchema {
    pub model: ClassifierSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly: Option<PolySchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<ScalerSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// Sibling `preprocessing_pipeline.json` accompanying a bare classifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreprocessingSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly_features: Option<PolySchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_selector: Option<SelectorSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<ScalerSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifier_tagged_by_type() {
        let parsed: ClassifierSchema =
            serde_json::from_value(json!({"type": "constant", "probabilities": [0.2, 0.8]}))
                .unwrap();
        assert_eq!(
            parsed,
            ClassifierSchema::Constant(ConstantSchema {
                probabilities: Some(vec![0.2, 0.8]),
                ..Default::default()
            })
        );

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["type"], "constant");
        assert!(json.get("label").is_none());
    }

    #[test]
    fn unknown_type_rejected() {
        let err = serde_json::from_value::<ClassifierSchema>(json!({"type": "svm"}));
        assert!(err.is_err());
    }

    #[test]
    fn poly_defaults() {
        let poly: PolySchema = serde_json::from_value(json!({"n_features_in": 21})).unwrap();
        assert_eq!(poly.degree, 2);
        assert!(poly.interaction_only);
        assert!(!poly.include_bias);
        assert!(poly.powers.is_none());
    }

    #[test]
    fn gbdt_transform_defaults_to_sigmoid() {
        let gbdt: GbdtSchema = serde_json::from_value(json!({
            "num_features": 1,
            "forest": {"trees": []}
        }))
        .unwrap();
        assert_eq!(gbdt.output_transform, OutputTransformSchema::Sigmoid);
        assert_eq!(gbdt.forest.base_score, 0.0);
    }

    #[test]
    fn bundle_optional_keys() {
        let bundle: BundleSchema = serde_json::from_value(json!({
            "model": {"type": "constant", "label": 1.0},
            "scaler": null
        }))
        .unwrap();
        assert!(bundle.scaler.is_none());
        assert!(bundle.threshold.is_none());
    }
}
