//! Request-time error types.
//!
//! Load-time failures live in [`crate::persist::LoadError`]; the types here are
//! produced while serving a single request.

// =============================================================================
// ValidationError
// =============================================================================

/// The request body could not be turned into a feature record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The body was valid JSON but not an object.
    #[error("not an object (got {found})")]
    NotAnObject { found: &'static str },

    /// The body was not valid JSON at all.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),
}

impl ValidationError {
    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAnObject { .. } => "NotAnObject",
            Self::MalformedJson(_) => "MalformedJson",
        }
    }
}

// =============================================================================
// InferenceError
// =============================================================================

/// A pipeline stage or the classifier failed on a reconciled row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// A supplied feature value cannot be read as a number.
    #[error("feature '{name}' has non-numeric value {value}")]
    NonNumericFeature { name: &'static str, value: String },

    /// A stage received a vector of the wrong width.
    #[error("{stage} expects {expected} features, got {actual}")]
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A stage produced NaN or an infinity where a finite value is required.
    #[error("{stage} produced a non-finite value")]
    NonFiniteOutput { stage: &'static str },

    /// The classifier returned a probability vector that is not two-class.
    #[error("expected probabilities for 2 classes, got {0}")]
    UnexpectedClassCount(usize),

    /// The classifier's direct label is not 0 or 1.
    #[error("classifier label {0} is outside {{0, 1}}")]
    LabelOutOfRange(f64),
}

impl InferenceError {
    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NonNumericFeature { .. } => "NonNumericFeature",
            Self::ShapeMismatch { .. } => "ShapeMismatch",
            Self::NonFiniteOutput { .. } => "NonFiniteOutput",
            Self::UnexpectedClassCount(_) => "UnexpectedClassCount",
            Self::LabelOutOfRange(_) => "LabelOutOfRange",
        }
    }

    /// Width check shared by stages and classifiers.
    pub(crate) fn check_width(
        stage: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::ShapeMismatch {
                stage,
                expected,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_width_accepts_equal() {
        assert!(InferenceError::check_width("scaler", 3, 3).is_ok());
    }

    #[test]
    fn check_width_reports_both_sides() {
        let err = InferenceError::check_width("scaler", 75, 21).unwrap_err();
        assert_eq!(err.to_string(), "scaler expects 75 features, got 21");
        assert_eq!(err.kind(), "ShapeMismatch");
    }

    #[test]
    fn validation_message_mentions_object() {
        let err = ValidationError::NotAnObject { found: "array" };
        assert_eq!(err.to_string(), "not an object (got array)");
    }
}
