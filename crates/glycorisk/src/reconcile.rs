//! Feature reconciliation.
//!
//! Maps a client-supplied, partial and unordered JSON record onto the fixed
//! [`FEATURE_NAMES`] layout. Values are carried through untouched; numeric
//! conversion happens when the pipeline consumes the row, so a non-numeric
//! value is an inference failure rather than a validation failure.
//!
//! # Example
//!
//! ```
//! use glycorisk::reconcile::reconcile;
//! use serde_json::json;
//!
//! let row = reconcile(&json!({"HighBP": 1, "BMI": 28, "Age": 9})).unwrap();
//! assert_eq!(row.len(), 21);
//! assert_eq!(row.defaulted().len(), 18);
//! ```

use ndarray::Array1;
use serde_json::{Map, Value};

use crate::error::{InferenceError, ValidationError};
use crate::schema::{DEFAULT_FEATURE_VALUE, FEATURE_NAMES, N_FEATURES};

// =============================================================================
// FeatureRow
// =============================================================================

/// A complete row in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<Value>,
    defaulted: Vec<&'static str>,
}

impl FeatureRow {
    /// Number of values (always [`N_FEATURES`]).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for a schema feature.
    pub fn get(&self, name: &str) -> Option<&Value> {
        crate::schema::feature_index(name).map(|i| &self.values[i])
    }

    /// Names of the features that were filled with the default.
    pub fn defaulted(&self) -> &[&'static str] {
        &self.defaulted
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        FEATURE_NAMES.iter().copied().zip(self.values.iter())
    }

    /// Convert to the numeric vector consumed by the pipeline.
    ///
    /// Numbers pass through, booleans become 0/1 and `null` becomes NaN (a
    /// missing value for tree classifiers). Anything else is rejected.
    pub fn to_array(&self) -> Result<Array1<f64>, InferenceError> {
        let mut out = Array1::zeros(self.values.len());
        for (slot, (name, value)) in out.iter_mut().zip(self.iter()) {
            *slot = numeric_value(name, value)?;
        }
        Ok(out)
    }
}

fn numeric_value(name: &'static str, value: &Value) -> Result<f64, InferenceError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| InferenceError::NonNumericFeature {
            name,
            value: n.to_string(),
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Ok(f64::NAN),
        other => Err(InferenceError::NonNumericFeature {
            name,
            value: other.to_string(),
        }),
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Reconcile an arbitrary JSON value into a [`FeatureRow`].
///
/// Only objects are accepted. Unknown keys are ignored and absent schema
/// features take [`DEFAULT_FEATURE_VALUE`].
pub fn reconcile(record: &Value) -> Result<FeatureRow, ValidationError> {
    match record {
        Value::Object(map) => Ok(reconcile_map(map)),
        other => Err(ValidationError::NotAnObject {
            found: json_type_name(other),
        }),
    }
}

/// Reconcile an already-destructured JSON object.
pub fn reconcile_map(map: &Map<String, Value>) -> FeatureRow {
    let mut values = Vec::with_capacity(N_FEATURES);
    let mut defaulted = Vec::new();

    for name in FEATURE_NAMES {
        match map.get(name) {
            Some(v) => values.push(v.clone()),
            None => {
                defaulted.push(name);
                values.push(Value::from(DEFAULT_FEATURE_VALUE));
            }
        }
    }

    FeatureRow { values, defaulted }
}

/// JSON type name used in validation messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
