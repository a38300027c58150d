//! Canonical decision tree representations used by tree classifiers.

pub mod forest;
pub mod node;
pub mod tree;

pub use forest::{Forest, ForestValidationError};
pub use node::{NodeId, NO_CHILD};
pub use tree::{Tree, TreeValidationError};
