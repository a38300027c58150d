//! Fixtures shared by unit and integration tests.
//!
//! Builders here produce artifact JSON in the on-disk format and small
//! bundles with predictable outputs. Committed fixtures live under
//! `tests/test-cases/` and are read with [`PredictionCases`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::ConstantClassifier;
use crate::persist::schema::{
    ClassifierSchema, ForestSchema, GbdtSchema, OutputTransformSchema, TreeSchema,
};
use crate::pipeline::{BundleError, PipelineBundle};
use crate::schema::{feature_index, FEATURE_NAMES, N_FEATURES};

/// Directory holding committed fixtures.
pub fn test_cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test-cases")
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json(path: &Path, value: &Value) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)
}

/// A classifier object that always answers `[1 - p1, p1]`.
pub fn constant_classifier_json(p1: f64) -> Value {
    json!({"type": "constant", "probabilities": [1.0 - p1, p1]})
}

/// A stage-less bundle around a constant classifier.
pub fn constant_bundle(p1: f64, threshold: f64) -> Result<PipelineBundle, BundleError> {
    PipelineBundle::builder()
        .classifier(Arc::new(ConstantClassifier::probabilities(vec![
            1.0 - p1,
            p1,
        ])))
        .threshold(threshold)
        .build()
}

/// Depth-1 tree schema splitting the named schema feature.
pub fn stump_schema(feature: &str, threshold: f64, left: f64, right: f64) -> Option<TreeSchema> {
    let index = u32::try_from(feature_index(feature)?).ok()?;
    Some(TreeSchema {
        split_indices: vec![index, 0, 0],
        thresholds: vec![threshold, 0.0, 0.0],
        children_left: vec![1, 0, 0],
        children_right: vec![2, 0, 0],
        default_left: vec![true, false, false],
        leaf_values: vec![0.0, left, right],
    })
}

/// Small sigmoid GBDT over the raw schema.
///
/// Margin: `-1.0 + (HighBP >= 0.5 ? 1.0 : -0.5) + (BMI >= 30 ? 1.0 : 0.0)
/// + (Age >= 9 ? 0.5 : -0.5)`.
pub fn risk_gbdt_schema() -> ClassifierSchema {
    let trees = [
        ("HighBP", 0.5, -0.5, 1.0),
        ("BMI", 30.0, 0.0, 1.0),
        ("Age", 9.0, -0.5, 0.5),
    ]
    .into_iter()
    .filter_map(|(f, t, l, r)| stump_schema(f, t, l, r))
    .collect();

    ClassifierSchema::Gbdt(GbdtSchema {
        num_features: N_FEATURES,
        feature_names: Some(FEATURE_NAMES.iter().map(|s| s.to_string()).collect()),
        forest: ForestSchema {
            trees,
            base_score: -1.0,
        },
        output_transform: OutputTransformSchema::Sigmoid,
    })
}

/// Request records paired with expected labels.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionCases {
    pub cases: Vec<PredictionCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionCase {
    pub record: Value,
    pub prediction: u8,
    #[serde(default)]
    pub note: Option<String>,
}

impl PredictionCases {
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
