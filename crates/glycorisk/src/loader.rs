//! Artifact loading and the write-once model slot.
//!
//! The primary artifact lives in the model directory as `model.json` (or, when
//! that is absent, a LightGBM `model.txt`). It is decoded into one of three
//! shapes, tried in order:
//!
//! 1. an object with a `model` key: classifier and stages in one document
//! 2. a bare classifier object, used without preprocessing
//! 3. a bare classifier plus a sibling `preprocessing_pipeline.json`
//!
//! Shape 3 is chosen over shape 2 whenever the sibling file exists.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::compat::lightgbm;
use crate::model::Classifier;
use crate::persist::schema::{
    BundleSchema, ClassifierSchema, PolySchema, PreprocessingSchema, ScalerSchema, SelectorSchema,
};
use crate::persist::{ArtifactError, LoadError};
use crate::pipeline::PipelineBundle;
use crate::preprocess::{FeatureSelector, PolynomialExpander, Scaler};
use crate::reconcile::json_type_name;
use crate::schema::schema_mismatches;

/// Default model directory, relative to the working directory.
pub const DEFAULT_MODEL_DIR: &str = "model";
/// Primary JSON artifact.
pub const MODEL_JSON: &str = "model.json";
/// Primary LightGBM artifact, used when [`MODEL_JSON`] is absent.
pub const MODEL_TXT: &str = "model.txt";
/// Sibling preprocessing artifact.
pub const PIPELINE_JSON: &str = "preprocessing_pipeline.json";

// =============================================================================
// ArtifactLocation
// =============================================================================

/// Where the artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    dir: PathBuf,
}

impl ArtifactLocation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_json(&self) -> PathBuf {
        self.dir.join(MODEL_JSON)
    }

    pub fn model_txt(&self) -> PathBuf {
        self.dir.join(MODEL_TXT)
    }

    pub fn pipeline_json(&self) -> PathBuf {
        self.dir.join(PIPELINE_JSON)
    }
}

impl Default for ArtifactLocation {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_DIR)
    }
}

// =============================================================================
// Shapes
// =============================================================================

/// Which artifact layout a bundle was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleShape {
    /// Single document with a `model` key.
    Bundle,
    /// Classifier only.
    BareClassifier,
    /// Classifier plus sibling preprocessing document.
    SplitPipeline,
}

impl BundleShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bundle => "bundle",
            Self::BareClassifier => "bare-classifier",
            Self::SplitPipeline => "split-pipeline",
        }
    }
}

impl fmt::Display for BundleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully loaded bundle and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub bundle: PipelineBundle,
    pub shape: BundleShape,
    pub path: PathBuf,
}

// =============================================================================
// Loading
// =============================================================================

/// Load the artifacts in `location`, logging the outcome.
pub fn load(location: &ArtifactLocation) -> Result<LoadedArtifact, LoadError> {
    match load_quiet(location) {
        Ok(loaded) => {
            log_loaded(&loaded);
            Ok(loaded)
        }
        Err(err) => {
            tracing::error!(
                dir = %location.dir().display(),
                kind = err.kind(),
                "failed to load model: {err}"
            );
            Err(err)
        }
    }
}

/// Re-run the load to report why the model is unavailable.
///
/// Returns `None` when the artifacts load cleanly now. Nothing is cached.
pub fn diagnose(location: &ArtifactLocation) -> Option<LoadError> {
    load_quiet(location).err()
}

fn load_quiet(location: &ArtifactLocation) -> Result<LoadedArtifact, LoadError> {
    let json = location.model_json();
    if json.is_file() {
        let value = read_json(&json)?;
        return decode_primary(location, json, value);
    }

    let txt = location.model_txt();
    if txt.is_file() {
        let classifier = lightgbm::load_classifier(&txt).map_err(|source| LoadError::LightGbm {
            path: txt.clone(),
            source,
        })?;
        return with_sibling(location, txt, Arc::new(classifier));
    }

    Err(LoadError::NotFound {
        dir: location.dir().to_path_buf(),
    })
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn from_value<T: DeserializeOwned>(
    path: &Path,
    component: &'static str,
    value: Value,
) -> Result<T, LoadError> {
    serde_json::from_value(value).map_err(|source| LoadError::Schema {
        path: path.to_path_buf(),
        component,
        source,
    })
}

fn decode_primary(
    location: &ArtifactLocation,
    path: PathBuf,
    value: Value,
) -> Result<LoadedArtifact, LoadError> {
    let Value::Object(map) = &value else {
        return Err(LoadError::UnrecognizedShape {
            reason: format!("expected an object, got {}", json_type_name(&value)),
            path,
        });
    };

    if map.contains_key("model") {
        let schema: BundleSchema = from_value(&path, "bundle", value)?;
        let classifier = artifact(&path, schema.model.into_classifier())?;
        let bundle = PipelineBundle::builder()
            .classifier(classifier)
            .maybe_poly(poly(&path, schema.poly)?)
            .maybe_selector(selector(&path, schema.selector)?)
            .maybe_scaler(scaler(&path, schema.scaler)?)
            .maybe_threshold(schema.threshold)
            .maybe_feature_names(schema.feature_names)
            .build()?;
        return Ok(LoadedArtifact {
            bundle,
            shape: BundleShape::Bundle,
            path,
        });
    }

    if map.contains_key("type") {
        let schema: ClassifierSchema = from_value(&path, "classifier", value)?;
        let classifier = artifact(&path, schema.into_classifier())?;
        return with_sibling(location, path, classifier);
    }

    Err(LoadError::UnrecognizedShape {
        path,
        reason: "object has neither a `model` nor a `type` key".to_string(),
    })
}

/// Attach the sibling preprocessing document, when there is one.
fn with_sibling(
    location: &ArtifactLocation,
    path: PathBuf,
    classifier: Arc<dyn Classifier>,
) -> Result<LoadedArtifact, LoadError> {
    let sibling = location.pipeline_json();
    if !sibling.is_file() {
        let bundle = PipelineBundle::builder().classifier(classifier).build()?;
        return Ok(LoadedArtifact {
            bundle,
            shape: BundleShape::BareClassifier,
            path,
        });
    }

    let value = read_json(&sibling)?;
    if !value.is_object() {
        return Err(LoadError::UnrecognizedShape {
            reason: format!("expected an object, got {}", json_type_name(&value)),
            path: sibling,
        });
    }
    let schema: PreprocessingSchema = from_value(&sibling, "preprocessing pipeline", value)?;
    let bundle = PipelineBundle::builder()
        .classifier(classifier)
        .maybe_poly(poly(&sibling, schema.poly_features)?)
        .maybe_selector(selector(&sibling, schema.feature_selector)?)
        .maybe_scaler(scaler(&sibling, schema.scaler)?)
        .maybe_feature_names(schema.feature_names)
        .build()?;
    Ok(LoadedArtifact {
        bundle,
        shape: BundleShape::SplitPipeline,
        path,
    })
}

fn artifact<T>(path: &Path, result: Result<T, ArtifactError>) -> Result<T, LoadError> {
    result.map_err(|source| LoadError::Artifact {
        path: path.to_path_buf(),
        source,
    })
}

fn poly(path: &Path, schema: Option<PolySchema>) -> Result<Option<PolynomialExpander>, LoadError> {
    schema
        .map(|s| artifact(path, PolynomialExpander::try_from(s).map_err(ArtifactError::from)))
        .transpose()
}

fn selector(
    path: &Path,
    schema: Option<SelectorSchema>,
) -> Result<Option<FeatureSelector>, LoadError> {
    schema
        .map(|s| artifact(path, FeatureSelector::try_from(s)))
        .transpose()
}

fn scaler(path: &Path, schema: Option<ScalerSchema>) -> Result<Option<Scaler>, LoadError> {
    schema
        .map(|s| artifact(path, Scaler::try_from(s).map_err(ArtifactError::from)))
        .transpose()
}

fn log_loaded(loaded: &LoadedArtifact) {
    let bundle = &loaded.bundle;
    let classifier = bundle.classifier();
    tracing::info!(
        path = %loaded.path.display(),
        shape = %loaded.shape,
        classifier = classifier.kind(),
        n_features = ?classifier.n_features(),
        stages = %bundle.describe_stages(),
        threshold = bundle.threshold(),
        "model loaded"
    );
    for stage in bundle.stages() {
        tracing::debug!(
            stage = stage.name(),
            n_in = ?stage.n_features_in(),
            n_out = ?stage.n_features_out(),
            "preprocessing stage"
        );
    }
    if let Some(names) = classifier.feature_names() {
        tracing::debug!(?names, "classifier feature names");
    }

    let Some(names) = bundle.feature_names() else {
        return;
    };
    tracing::info!(count = names.len(), "artifact records feature names");
    let mismatches = schema_mismatches(names);
    if !mismatches.is_empty() {
        tracing::warn!(
            mismatches = mismatches.len(),
            "recorded feature names differ from the serving schema; the serving schema is used"
        );
        for (position, recorded, expected) in mismatches {
            tracing::warn!(
                position,
                recorded = %recorded,
                expected = %expected,
                "feature name mismatch"
            );
        }
    }
}

// =============================================================================
// Model state
// =============================================================================

/// Availability of the model for the lifetime of the process.
#[derive(Debug, Clone)]
pub enum ModelState {
    Loaded(Arc<LoadedArtifact>),
    Absent(Arc<LoadError>),
}

impl ModelState {
    pub fn from_result(result: Result<LoadedArtifact, LoadError>) -> Self {
        match result {
            Ok(loaded) => Self::Loaded(Arc::new(loaded)),
            Err(err) => Self::Absent(Arc::new(err)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn bundle(&self) -> Option<&PipelineBundle> {
        match self {
            Self::Loaded(loaded) => Some(&loaded.bundle),
            Self::Absent(_) => None,
        }
    }

    /// Cause recorded when loading failed.
    pub fn cause(&self) -> Option<&LoadError> {
        match self {
            Self::Loaded(_) => None,
            Self::Absent(err) => Some(err),
        }
    }
}

/// Write-once holder for the process-wide [`ModelState`].
#[derive(Debug, Default)]
pub struct ModelSlot {
    state: OnceLock<ModelState>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `location` on first call; later calls return the first result.
    pub fn initialize(&self, location: &ArtifactLocation) -> &ModelState {
        self.state.get_or_init(|| ModelState::from_result(load(location)))
    }

    /// Install a state directly. Fails, returning the state, if already set.
    pub fn set(&self, state: ModelState) -> Result<(), ModelState> {
        self.state.set(state)
    }

    pub fn get(&self) -> Option<&ModelState> {
        self.state.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_json;
    use serde_json::json;

    #[test]
    fn location_paths() {
        let loc = ArtifactLocation::new("/srv/model");
        assert_eq!(loc.model_json(), PathBuf::from("/srv/model/model.json"));
        assert_eq!(loc.model_txt(), PathBuf::from("/srv/model/model.txt"));
        assert_eq!(
            loc.pipeline_json(),
            PathBuf::from("/srv/model/preprocessing_pipeline.json")
        );
        assert_eq!(ArtifactLocation::default().dir(), Path::new("model"));
    }

    #[test]
    fn slot_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let location = ArtifactLocation::new(dir.path());
        let slot = ModelSlot::new();
        assert!(slot.get().is_none());
        assert!(!slot.initialize(&location).is_loaded());

        write_json(&location.model_json(), &json!({"type": "constant", "label": 1.0})).unwrap();
        // A later artifact does not replace the first outcome.
        assert!(!slot.initialize(&location).is_loaded());
        assert!(slot.set(ModelState::from_result(load(&location))).is_err());
        assert!(!slot.get().unwrap().is_loaded());
    }

    #[test]
    fn diagnose_reports_cause_without_caching() {
        let dir = tempfile::tempdir().unwrap();
        let location = ArtifactLocation::new(dir.path());
        assert!(matches!(
            diagnose(&location),
            Some(LoadError::NotFound { .. })
        ));
        write_json(&location.model_json(), &json!({"type": "constant", "label": 0.0})).unwrap();
        assert!(diagnose(&location).is_none());
    }

    #[test]
    fn non_object_primary_is_unrecognized() {
        let dir = tempfile::tempdir().unwrap();
        let location = ArtifactLocation::new(dir.path());
        write_json(&location.model_json(), &json!([1, 2, 3])).unwrap();
        let err = load(&location).unwrap_err();
        assert!(matches!(err, LoadError::UnrecognizedShape { .. }));
        assert!(err.to_string().contains("got array"));
    }

    #[test]
    fn state_accessors() {
        let absent = ModelState::from_result(Err(LoadError::NotFound {
            dir: PathBuf::from("model"),
        }));
        assert!(!absent.is_loaded());
        assert!(absent.bundle().is_none());
        assert_eq!(absent.cause().map(LoadError::kind), Some("NotFound"));
    }
}
