//! Gradient boosted decision tree classifier.

use ndarray::ArrayView1;

use super::{Classifier, ClassifierOutput, OutputTransform};
use crate::error::InferenceError;
use crate::repr::{Forest, ForestValidationError};

/// Tree ensemble classifier.
///
/// The forest produces a raw margin; the [`OutputTransform`] turns it into a
/// two-class distribution (sigmoid) or a direct label (identity).
#[derive(Debug, Clone)]
pub struct GbdtClassifier {
    forest: Forest,
    transform: OutputTransform,
    n_features: usize,
    feature_names: Option<Vec<String>>,
}

impl GbdtClassifier {
    /// Wrap a forest, validating it against the declared input width.
    pub fn new(
        forest: Forest,
        transform: OutputTransform,
        n_features: usize,
    ) -> Result<Self, ForestValidationError> {
        forest.validate(n_features)?;
        Ok(Self {
            forest,
            transform,
            n_features,
            feature_names: None,
        })
    }

    /// Attach recorded feature names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn transform(&self) -> OutputTransform {
        self.transform
    }
}

impl Classifier for GbdtClassifier {
    fn kind(&self) -> &'static str {
        "gbdt"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn classify(&self, features: ArrayView1<'_, f64>) -> Result<ClassifierOutput, InferenceError> {
        InferenceError::check_width("gbdt classifier", self.n_features, features.len())?;
        let margin = self.forest.predict_row(features);
        Ok(self.transform.apply(margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::Tree;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn classifier(transform: OutputTransform) -> GbdtClassifier {
        let forest = Forest::new(0.0)
            .with_tree(Tree::stump(1, 25.0, -2.0, 2.0))
            .with_tree(Tree::stump(0, 0.5, -0.5, 0.5));
        GbdtClassifier::new(forest, transform, 2).unwrap()
    }

    #[test]
    fn sigmoid_output_is_two_class() {
        let out = classifier(OutputTransform::Sigmoid)
            .classify(array![1.0, 30.0].view())
            .unwrap();
        let ClassifierOutput::Probabilities(p) = out else {
            panic!("expected probabilities");
        };
        assert_eq!(p.len(), 2);
        assert_abs_diff_eq!(p[1], 1.0 / (1.0 + (-2.5f64).exp()), epsilon = 1e-12);
    }

    #[test]
    fn identity_output_is_label() {
        let out = classifier(OutputTransform::Identity)
            .classify(array![0.0, 0.0].view())
            .unwrap();
        assert_eq!(out, ClassifierOutput::Label(-2.5));
    }

    #[test]
    fn width_is_enforced() {
        let err = classifier(OutputTransform::Sigmoid)
            .classify(array![1.0, 2.0, 3.0].view())
            .unwrap_err();
        assert_eq!(
            err,
            InferenceError::ShapeMismatch {
                stage: "gbdt classifier",
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn construction_rejects_narrow_width() {
        let forest = Forest::new(0.0).with_tree(Tree::stump(4, 0.0, 0.0, 1.0));
        assert!(GbdtClassifier::new(forest, OutputTransform::Sigmoid, 3).is_err());
    }
}
