//! Classifiers.
//!
//! Every loaded classifier implements [`Classifier`]. Conformance is decided
//! once, when the artifact is converted; the request path only ever sees a
//! `dyn Classifier`.
//!
//! # Overview
//!
//! - [`GbdtClassifier`]: additive tree ensemble (native JSON or LightGBM text)
//! - [`LogisticClassifier`]: linear model with a logistic link
//! - [`ConstantClassifier`]: fixed distribution or label (prior / dummy model)

mod constant;
mod gbdt;
mod linear;
pub mod transform;

pub use constant::ConstantClassifier;
pub use gbdt::GbdtClassifier;
pub use linear::LogisticClassifier;
pub use transform::OutputTransform;

use std::fmt;

use ndarray::ArrayView1;

use crate::error::InferenceError;

/// Raw output of a classifier for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutput {
    /// Class probability distribution, indexed by class.
    Probabilities(Vec<f64>),
    /// Direct class prediction, for models that cannot produce probabilities.
    Label(f64),
}

/// A binary classifier over a fixed-width numeric row.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Short name of the model family, for logs and diagnostics.
    fn kind(&self) -> &'static str;

    /// Input width the classifier requires, when it declares one.
    fn n_features(&self) -> Option<usize>;

    /// Feature names recorded with the classifier, if any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Classify a single row.
    fn classify(&self, features: ArrayView1<'_, f64>) -> Result<ClassifierOutput, InferenceError>;
}
