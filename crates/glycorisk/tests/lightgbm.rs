//! LightGBM text models served end to end.

use glycorisk::compat::lightgbm::{load_classifier, LgbModel, LgbObjective};
use glycorisk::loader::{self, ArtifactLocation, BundleShape};
use glycorisk::reconcile::reconcile;
use glycorisk::schema::{FEATURE_NAMES, N_FEATURES};
use glycorisk::testing::{test_cases_dir, write_json, PredictionCases};
use glycorisk::Classifier;
use serde_json::json;

fn binary_dir() -> std::path::PathBuf {
    test_cases_dir().join("lightgbm/binary")
}

#[test]
fn parses_fixture_header() {
    let model = LgbModel::from_file(binary_dir().join("model.txt")).unwrap();
    assert_eq!(model.num_trees(), 2);
    assert_eq!(model.num_features(), N_FEATURES);
    assert!(matches!(model.header.objective, Some(LgbObjective::Binary { .. })));
    assert_eq!(model.header.feature_names[0], FEATURE_NAMES[0]);
}

#[test]
fn fixture_cases_match() {
    let loaded = loader::load(&ArtifactLocation::new(binary_dir())).unwrap();
    assert_eq!(loaded.bundle.classifier().kind(), "gbdt");

    let cases = PredictionCases::from_file(binary_dir().join("cases.json")).unwrap();
    for case in cases.cases {
        let row = reconcile(&case.record).unwrap();
        let got = loaded.bundle.predict(&row).unwrap();
        assert_eq!(
            got, case.prediction,
            "record {} ({})",
            case.record,
            case.note.as_deref().unwrap_or("")
        );
    }
}

#[test]
fn classifier_keeps_feature_names() {
    let classifier = load_classifier(binary_dir().join("model.txt")).unwrap();
    assert_eq!(classifier.n_features(), Some(N_FEATURES));
    assert_eq!(classifier.feature_names().map(<[String]>::len), Some(N_FEATURES));
}

#[test]
fn text_model_with_sibling_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let location = ArtifactLocation::new(dir.path());
    std::fs::copy(binary_dir().join("model.txt"), location.model_txt()).unwrap();
    write_json(
        &location.pipeline_json(),
        &json!({"scaler": {"mean": vec![0.0; N_FEATURES]}, "feature_names": FEATURE_NAMES}),
    )
    .unwrap();

    let loaded = loader::load(&location).unwrap();
    assert_eq!(loaded.shape, BundleShape::SplitPipeline);
    assert_eq!(loaded.path, location.model_txt());
    let row = reconcile(&json!({"HighBP": 1, "BMI": 28, "Age": 9})).unwrap();
    assert_eq!(loaded.bundle.predict(&row).unwrap(), 1);
}

#[test]
fn model_json_takes_precedence_over_text() {
    let dir = tempfile::tempdir().unwrap();
    let location = ArtifactLocation::new(dir.path());
    std::fs::copy(binary_dir().join("model.txt"), location.model_txt()).unwrap();
    write_json(&location.model_json(), &json!({"type": "constant", "label": 0.0})).unwrap();

    let loaded = loader::load(&location).unwrap();
    assert_eq!(loaded.bundle.classifier().kind(), "constant");
}

#[test]
fn truncated_text_model_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let location = ArtifactLocation::new(dir.path());
    std::fs::write(location.model_txt(), "tree\nversion=v3\nnum_class=1\n").unwrap();

    let err = loader::load(&location).unwrap_err();
    assert_eq!(err.kind(), "LightGbm");
}
