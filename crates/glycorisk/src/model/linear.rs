//! Logistic regression classifier.

use ndarray::{Array1, ArrayView1};

use super::{Classifier, ClassifierOutput, OutputTransform};
use crate::error::InferenceError;

/// Linear model `w·x + b` with a logistic link.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    weights: Array1<f64>,
    bias: f64,
    feature_names: Option<Vec<String>>,
}

impl LogisticClassifier {
    pub fn new(weights: Array1<f64>, bias: f64) -> Self {
        Self {
            weights,
            bias,
            feature_names: None,
        }
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Raw margin for a row of matching width.
    pub fn margin(&self, features: ArrayView1<'_, f64>) -> f64 {
        self.weights.dot(&features) + self.bias
    }
}

impl Classifier for LogisticClassifier {
    fn kind(&self) -> &'static str {
        "logistic"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn classify(&self, features: ArrayView1<'_, f64>) -> Result<ClassifierOutput, InferenceError> {
        InferenceError::check_width("logistic classifier", self.weights.len(), features.len())?;
        Ok(OutputTransform::Sigmoid.apply(self.margin(features)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn margin_is_affine() {
        let model = LogisticClassifier::new(array![0.5, -1.0, 2.0], 0.25);
        assert_abs_diff_eq!(model.margin(array![2.0, 1.0, 0.5].view()), 1.25);
    }

    #[test]
    fn zero_margin_is_even_odds() {
        let model = LogisticClassifier::new(array![1.0, 1.0], 0.0);
        let out = model.classify(array![1.0, -1.0].view()).unwrap();
        assert_eq!(out, ClassifierOutput::Probabilities(vec![0.5, 0.5]));
    }

    #[test]
    fn width_is_enforced() {
        let model = LogisticClassifier::new(array![1.0, 1.0], 0.0);
        assert!(matches!(
            model.classify(array![1.0].view()),
            Err(InferenceError::ShapeMismatch { expected: 2, actual: 1, .. })
        ));
    }
}
