//! Constant (prior) classifier.

use ndarray::ArrayView1;

use super::{Classifier, ClassifierOutput};
use crate::error::InferenceError;

/// Classifier that ignores its input.
///
/// Used as a baseline artifact and as a deterministic stand-in in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantClassifier {
    output: ClassifierOutput,
    n_features: Option<usize>,
}

impl ConstantClassifier {
    /// Always return the given class distribution.
    pub fn probabilities(probabilities: Vec<f64>) -> Self {
        Self {
            output: ClassifierOutput::Probabilities(probabilities),
            n_features: None,
        }
    }

    /// Always return the given label; the classifier exposes no probabilities.
    pub fn label(label: f64) -> Self {
        Self {
            output: ClassifierOutput::Label(label),
            n_features: None,
        }
    }

    /// Require rows of a fixed width.
    pub fn with_n_features(mut self, n_features: usize) -> Self {
        self.n_features = Some(n_features);
        self
    }
}

impl Classifier for ConstantClassifier {
    fn kind(&self) -> &'static str {
        "constant"
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn classify(&self, features: ArrayView1<'_, f64>) -> Result<ClassifierOutput, InferenceError> {
        if let Some(n) = self.n_features {
            InferenceError::check_width("constant classifier", n, features.len())?;
        }
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn output_ignores_input() {
        let model = ConstantClassifier::probabilities(vec![0.2, 0.8]);
        for x in [Array1::zeros(21), Array1::ones(3)] {
            assert_eq!(
                model.classify(x.view()).unwrap(),
                ClassifierOutput::Probabilities(vec![0.2, 0.8])
            );
        }
    }

    #[test]
    fn declared_width_is_enforced() {
        let model = ConstantClassifier::label(1.0).with_n_features(21);
        assert!(model.classify(Array1::zeros(21).view()).is_ok());
        assert!(model.classify(Array1::zeros(20).view()).is_err());
    }
}
