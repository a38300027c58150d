//! Pipeline bundle and inference.
//!
//! A [`PipelineBundle`] owns a classifier, at most one of each preprocessing
//! stage, and the decision threshold. It is immutable once built and shared
//! read-only across requests.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use glycorisk::model::ConstantClassifier;
//! use glycorisk::pipeline::PipelineBundle;
//! use ndarray::Array1;
//!
//! let bundle = PipelineBundle::builder()
//!     .classifier(Arc::new(ConstantClassifier::probabilities(vec![0.2, 0.8])))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(bundle.infer(Array1::zeros(21).view()).unwrap(), 1);
//! ```

use std::sync::Arc;

use bon::Builder;
use ndarray::{Array1, ArrayView1};

use crate::error::InferenceError;
use crate::model::{Classifier, ClassifierOutput};
use crate::preprocess::{FeatureSelector, PolynomialExpander, Scaler, Transform};
use crate::reconcile::FeatureRow;

/// Default decision threshold on the positive-class probability.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

// =============================================================================
// BundleError
// =============================================================================

/// The bundle's parts do not fit together.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BundleError {
    #[error("threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    #[error("{upstream} produces {produces} features but {downstream} expects {expects}")]
    StageWidthMismatch {
        upstream: &'static str,
        produces: usize,
        downstream: &'static str,
        expects: usize,
    },
}

// =============================================================================
// PipelineBundle
// =============================================================================

/// Classifier plus optional preprocessing stages and a decision threshold.
#[derive(Debug, Clone, Builder)]
#[builder(finish_fn(vis = "", name = __build_internal))]
pub struct PipelineBundle {
    classifier: Arc<dyn Classifier>,
    poly: Option<PolynomialExpander>,
    selector: Option<FeatureSelector>,
    scaler: Option<Scaler>,
    /// Positive-class probability at or above which the label is 1.
    #[builder(default = DEFAULT_THRESHOLD)]
    threshold: f64,
    /// Feature names recorded by training, informational only.
    feature_names: Option<Vec<String>>,
}

impl<S: pipeline_bundle_builder::IsComplete> PipelineBundleBuilder<S> {
    /// Build and validate the bundle.
    ///
    /// # Errors
    ///
    /// - threshold not within [0, 1]
    /// - adjacent stages (or the last stage and the classifier) disagree on width
    pub fn build(self) -> Result<PipelineBundle, BundleError> {
        let bundle = self.__build_internal();
        bundle.validate()?;
        Ok(bundle)
    }
}

impl PipelineBundle {
    fn validate(&self) -> Result<(), BundleError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(BundleError::InvalidThreshold(self.threshold));
        }

        let mut upstream: Option<(&'static str, Option<usize>)> = None;
        let classifier_width = self.classifier.n_features();
        let steps = self
            .stages()
            .map(|s| (s.name(), s.n_features_in(), s.min_features_in(), s.n_features_out()))
            .chain(std::iter::once((
                "classifier",
                classifier_width,
                classifier_width,
                None,
            )));
        for (name, exact, min, output) in steps {
            if let Some((prev, Some(produces))) = upstream {
                let expects = match (exact, min) {
                    (Some(n), _) if produces != n => Some(n),
                    (None, Some(n)) if produces < n => Some(n),
                    _ => None,
                };
                if let Some(expects) = expects {
                    return Err(BundleError::StageWidthMismatch {
                        upstream: prev,
                        produces,
                        downstream: name,
                        expects,
                    });
                }
            }
            upstream = Some((name, output));
        }
        Ok(())
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Present stages in application order.
    pub fn stages(&self) -> impl Iterator<Item = &dyn Transform> {
        let poly = self.poly.as_ref().map(|s| s as &dyn Transform);
        let selector = self.selector.as_ref().map(|s| s as &dyn Transform);
        let scaler = self.scaler.as_ref().map(|s| s as &dyn Transform);
        [poly, selector, scaler].into_iter().flatten()
    }

    /// One-line description of the stages, e.g. `poly(21->231) -> scaler(231)`.
    pub fn describe_stages(&self) -> String {
        let parts: Vec<String> = self
            .stages()
            .map(|s| match (s.n_features_in(), s.n_features_out()) {
                (Some(i), Some(o)) if i == o => format!("{}({i})", s.name()),
                (Some(i), Some(o)) => format!("{}({i}->{o})", s.name()),
                (None, Some(o)) => format!("{}(?->{o})", s.name()),
                _ => s.name().to_string(),
            })
            .collect();
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" -> ")
        }
    }

    /// Run the stages and the classifier on one row and threshold the result.
    ///
    /// Returns 1 when the positive-class probability is at least the
    /// threshold, else 0. Classifiers without probabilities return their
    /// label, which must be 0 or 1.
    pub fn infer(&self, features: ArrayView1<'_, f64>) -> Result<u8, InferenceError> {
        let mut row: Array1<f64> = features.to_owned();
        for stage in self.stages() {
            row = stage.transform(row.view())?;
            tracing::debug!(stage = stage.name(), width = row.len(), "applied stage");
        }

        let output = self.classifier.classify(row.view())?;
        tracing::debug!(?output, "classifier output");

        let label = self.decide(output)?;
        tracing::debug!(label, "prediction");
        Ok(label)
    }

    /// Convert a reconciled record and run [`infer`](Self::infer).
    pub fn predict(&self, row: &FeatureRow) -> Result<u8, InferenceError> {
        let features = row.to_array()?;
        self.infer(features.view())
    }

    fn decide(&self, output: ClassifierOutput) -> Result<u8, InferenceError> {
        match output {
            ClassifierOutput::Probabilities(p) if p.len() == 2 => {
                let positive = p[1];
                if !positive.is_finite() {
                    return Err(InferenceError::NonFiniteOutput {
                        stage: "classifier",
                    });
                }
                Ok(u8::from(positive >= self.threshold))
            }
            ClassifierOutput::Probabilities(p) => {
                Err(InferenceError::UnexpectedClassCount(p.len()))
            }
            ClassifierOutput::Label(label) => {
                if !label.is_finite() {
                    return Err(InferenceError::NonFiniteOutput {
                        stage: "classifier",
                    });
                }
                let truncated = label.trunc();
                if truncated == 0.0 {
                    Ok(0)
                } else if truncated == 1.0 {
                    Ok(1)
                } else {
                    Err(InferenceError::LabelOutOfRange(label))
                }
            }
        }
    }
}
