//! Model artifact persistence.
//!
//! Artifacts are JSON documents; [`schema`] holds their serde types and
//! [`convert`] turns them into validated runtime classifiers and stages.

pub mod convert;
mod error;
pub mod schema;

pub use error::{ArtifactError, LoadError};
