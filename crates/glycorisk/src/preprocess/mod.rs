//! Feature-engineering stages applied before classification.
//!
//! A [`PipelineBundle`](crate::pipeline::PipelineBundle) holds at most one of
//! each stage and always runs them in the same order:
//! polynomial expansion, then selection, then scaling.

mod poly;
mod scaler;
mod selector;

pub use poly::{PolyError, PolynomialExpander};
pub use scaler::{Scaler, ScalerError};
pub use selector::{FeatureSelector, SelectorError};

use std::fmt;

use ndarray::{Array1, ArrayView1};

use crate::error::InferenceError;

/// A vector-to-vector preprocessing stage.
pub trait Transform: Send + Sync + fmt::Debug {
    /// Stage name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Input width, when the stage declares one.
    fn n_features_in(&self) -> Option<usize>;

    /// Smallest input width the stage can accept, when known without a row.
    fn min_features_in(&self) -> Option<usize> {
        self.n_features_in()
    }

    /// Output width, when it is known without seeing a row.
    fn n_features_out(&self) -> Option<usize>;

    /// Transform a single row.
    fn transform(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, InferenceError>;
}
