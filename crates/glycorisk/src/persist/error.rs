//! Load-time error types.

use std::path::PathBuf;

use crate::compat::lightgbm::LightGbmError;
use crate::pipeline::BundleError;
use crate::preprocess::{PolyError, ScalerError, SelectorError};
use crate::repr::ForestValidationError;

/// A decoded artifact component failed validation.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("invalid forest: {0}")]
    Forest(#[from] ForestValidationError),
    #[error("invalid polynomial expander: {0}")]
    Poly(#[from] PolyError),
    #[error("invalid feature selector: {0}")]
    Selector(#[from] SelectorError),
    #[error("invalid scaler: {0}")]
    Scaler(#[from] ScalerError),
    #[error("invalid {component}: {message}")]
    Invalid {
        component: &'static str,
        message: String,
    },
}

impl ArtifactError {
    pub(crate) fn invalid(component: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            component,
            message: message.into(),
        }
    }
}

/// The model could not be loaded; the service stays in the absent state.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no model artifact found in {}", dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not hold a recognized artifact: {reason}", path.display())]
    UnrecognizedShape { path: PathBuf, reason: String },

    #[error("{}: malformed {component}: {source}", path.display())]
    Schema {
        path: PathBuf,
        component: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },

    #[error("{}: {source}", path.display())]
    LightGbm {
        path: PathBuf,
        #[source]
        source: LightGbmError,
    },

    #[error("invalid pipeline: {0}")]
    Bundle(#[from] BundleError),
}

impl LoadError {
    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::Io { .. } => "Io",
            Self::Json { .. } => "Json",
            Self::UnrecognizedShape { .. } => "UnrecognizedShape",
            Self::Schema { .. } => "Schema",
            Self::Artifact { .. } => "Artifact",
            Self::LightGbm { .. } => "LightGbm",
            Self::Bundle(_) => "Bundle",
        }
    }
}
