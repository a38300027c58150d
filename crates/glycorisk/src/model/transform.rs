//! Output transformation for tree and linear classifiers.
//!
//! The [`OutputTransform`] decides how a raw margin becomes classifier output.
//! It is persisted with the model so inference needs no training objective.
//!
//! # Variants
//!
//! - [`Sigmoid`](OutputTransform::Sigmoid): logistic link; output is a two-class distribution
//! - [`Identity`](OutputTransform::Identity): the margin is the predicted class label

use super::ClassifierOutput;

/// Inference-time output transformation for a single margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputTransform {
    /// Logistic sigmoid: p = 1 / (1 + exp(-margin)), output `[1 - p, p]`.
    #[default]
    Sigmoid,

    /// No transformation; the margin is returned as a direct label.
    Identity,
}

impl OutputTransform {
    /// Convert a margin into classifier output.
    ///
    /// NaN margins propagate (garbage-in, garbage-out); the pipeline rejects
    /// non-finite outputs.
    #[inline]
    pub fn apply(&self, margin: f64) -> ClassifierOutput {
        match self {
            OutputTransform::Sigmoid => {
                let p = sigmoid(margin);
                ClassifierOutput::Probabilities(vec![1.0 - p, p])
            }
            OutputTransform::Identity => ClassifierOutput::Label(margin),
        }
    }
}

/// Numerically stable sigmoid.
/// Clamps input to [-500, 500] to prevent overflow.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    let clamped = x.clamp(-500.0, 500.0);
    if clamped >= 0.0 {
        1.0 / (1.0 + (-clamped).exp())
    } else {
        let e = clamped.exp();
        e / (1.0 + e)
    }
}
