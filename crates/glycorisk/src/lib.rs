//! glycorisk: diabetes-risk inference over gradient boosted trees.
//!
//! Loads a trained binary classifier plus its optional preprocessing stages
//! from a model directory and answers one prediction per JSON record.
//!
//! # Key Types
//!
//! - [`PipelineBundle`] - preprocessing stages, classifier and decision threshold
//! - [`Classifier`] / [`Transform`] - the two traits a bundle is built from
//! - [`PredictionService`] - predict and health, independent of HTTP
//! - [`ModelSlot`] / [`ModelState`] - write-once, process-wide model handle
//!
//! # Request flow
//!
//! A JSON record is [reconciled](reconcile) against the fixed feature
//! [`schema`]: unknown keys are dropped, missing features default to 0 and
//! the schema order is imposed. The bundle then runs its stages in order
//! and thresholds the positive-class probability.
//!
//! # Artifacts
//!
//! See [`loader`] for the three accepted on-disk shapes and
//! [`compat::lightgbm`] for LightGBM text models.

pub mod compat;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod preprocess;
pub mod reconcile;
pub mod repr;
pub mod schema;
pub mod service;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use error::{InferenceError, ValidationError};
pub use loader::{ArtifactLocation, BundleShape, LoadedArtifact, ModelSlot, ModelState};
pub use model::{Classifier, ClassifierOutput, GbdtClassifier};
pub use persist::LoadError;
pub use pipeline::{BundleError, PipelineBundle};
pub use preprocess::Transform;
pub use reconcile::{reconcile, FeatureRow};
pub use service::{PredictionService, ServiceError};
