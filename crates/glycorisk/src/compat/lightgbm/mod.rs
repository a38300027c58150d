//! LightGBM model format support.
//!
//! Parses LightGBM's text model format and converts binary models into a
//! [`GbdtClassifier`](crate::model::GbdtClassifier).
//!
//! # Format Overview
//!
//! - **Header**: `num_class`, `max_feature_idx`, objective, feature names
//! - **Trees**: one `Tree=N` block per tree (split arrays, leaf values, decision types)
//! - **Footer**: importances and parameters, skipped
//!
//! # Differences from the canonical tree
//!
//! - LightGBM sends a value left when `value <= threshold`; canonical trees use `<`
//! - Leaves are negative child pointers (`!k`) rather than node indices
//! - `decision_type` is a bitfield of categorical flag, default direction and missing type

mod convert;
mod text;

use std::path::Path;

pub use convert::ConversionError;
pub use text::{DecisionType, LgbHeader, LgbModel, LgbObjective, LgbTree, MissingType, ParseError};

use crate::model::GbdtClassifier;

/// Failure reading a LightGBM model file.
#[derive(Debug, thiserror::Error)]
pub enum LightGbmError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

/// Parse and convert a LightGBM text model.
pub fn load_classifier(path: impl AsRef<Path>) -> Result<GbdtClassifier, LightGbmError> {
    let model = LgbModel::from_file(path)?;
    Ok(model.to_classifier()?)
}
