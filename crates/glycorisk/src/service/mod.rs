//! Prediction service.
//!
//! [`PredictionService`] owns an immutable [`ModelState`] handle and answers
//! the two operations the HTTP surface exposes: predict and health. It knows
//! nothing about axum; [`http`] adapts it.

pub mod http;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{InferenceError, ValidationError};
use crate::loader::{self, ArtifactLocation, ModelSlot, ModelState};
use crate::reconcile::reconcile;

// =============================================================================
// ServiceError
// =============================================================================

/// Failure of a single predict call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// The model is absent; every predict call fails the same way.
    #[error("model not loaded")]
    ModelUnavailable,

    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("prediction failed: {0}")]
    Inference(#[from] InferenceError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ModelUnavailable | Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the client.
    pub fn body(&self) -> Value {
        match self {
            Self::ModelUnavailable => json!({"error": "Model not loaded"}),
            Self::Validation(err @ ValidationError::NotAnObject { .. }) => json!({
                "error": "Invalid input: data must be a JSON object.",
                "details": err.to_string(),
            }),
            Self::Validation(ValidationError::MalformedJson(details)) => json!({
                "error": "Invalid request: body is not valid JSON.",
                "details": details,
            }),
            Self::Inference(err) => json!({
                "error": "Failed to make a prediction.",
                "details": err.to_string(),
                "type": err.kind(),
            }),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Successful predict response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub prediction: u8,
}

/// Health report; `detail` explains an absent model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// =============================================================================
// PredictionService
// =============================================================================

/// Request-facing façade over the loaded model.
#[derive(Debug, Clone)]
pub struct PredictionService {
    state: ModelState,
    location: Option<ArtifactLocation>,
}

impl PredictionService {
    /// Serve a fixed state. `location` enables diagnostic re-loads in health.
    pub fn new(state: ModelState, location: Option<ArtifactLocation>) -> Self {
        Self { state, location }
    }

    /// Initialize `slot` from `location` (first call only) and serve its state.
    pub fn from_slot(slot: &ModelSlot, location: ArtifactLocation) -> Self {
        let state = slot.initialize(&location).clone();
        Self::new(state, Some(location))
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Predict from a raw request body.
    pub fn predict_body(&self, body: &[u8]) -> Result<Prediction, ServiceError> {
        if !self.state.is_loaded() {
            return Err(ServiceError::ModelUnavailable);
        }
        let record: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        self.predict(&record)
    }

    /// Predict from a decoded JSON record.
    pub fn predict(&self, record: &Value) -> Result<Prediction, ServiceError> {
        let bundle = self.state.bundle().ok_or(ServiceError::ModelUnavailable)?;

        let row = reconcile(record)?;
        if let Value::Object(map) = record {
            tracing::debug!(keys = ?map.keys().collect::<Vec<_>>(), "predict request");
        }
        for name in row.defaulted() {
            tracing::debug!(feature = name, "using default value 0 for missing feature");
        }

        let prediction = bundle.predict(&row).map_err(|err| {
            tracing::error!(kind = err.kind(), "inference failed: {err}");
            ServiceError::Inference(err)
        })?;
        Ok(Prediction { prediction })
    }

    /// Report whether the model is available.
    ///
    /// When it is absent and a location is known, the artifacts are loaded
    /// again purely to describe the failure; the served state is unchanged.
    pub fn health(&self) -> Health {
        match &self.state {
            ModelState::Loaded(_) => Health {
                status: "ok",
                model_loaded: true,
                detail: None,
            },
            ModelState::Absent(cause) => {
                let detail = match &self.location {
                    Some(location) => match loader::diagnose(location) {
                        Some(err) => err.to_string(),
                        None => format!(
                            "{} loads now but failed at startup ({cause}); restart to serve it",
                            location.dir().display()
                        ),
                    },
                    None => cause.to_string(),
                };
                Health {
                    status: "error",
                    model_loaded: false,
                    detail: Some(detail),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{BundleShape, LoadedArtifact};
    use crate::persist::LoadError;
    use crate::testing::constant_bundle;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn loaded(p1: f64) -> PredictionService {
        let bundle = constant_bundle(p1, 0.5).unwrap();
        let state = ModelState::Loaded(Arc::new(LoadedArtifact {
            bundle,
            shape: BundleShape::BareClassifier,
            path: PathBuf::from("model/model.json"),
        }));
        PredictionService::new(state, None)
    }

    fn absent() -> PredictionService {
        let state = ModelState::Absent(Arc::new(LoadError::NotFound {
            dir: PathBuf::from("model"),
        }));
        PredictionService::new(state, None)
    }

    #[test]
    fn predict_positive() {
        let service = loaded(0.8);
        let out = service
            .predict(&json!({"HighBP": 1, "BMI": 28, "Age": 9}))
            .unwrap();
        assert_eq!(out, Prediction { prediction: 1 });
    }

    #[test]
    fn empty_record_completes() {
        assert_eq!(loaded(0.2).predict(&json!({})).unwrap().prediction, 0);
    }

    #[test]
    fn non_object_is_validation_error() {
        let err = loaded(0.8).predict(&json!([1, 2])).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body()["error"],
            "Invalid input: data must be a JSON object."
        );
    }

    #[test]
    fn malformed_body() {
        let err = loaded(0.8).predict_body(b"{not json").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MalformedJson(_))
        ));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn absent_model_wins_over_bad_body() {
        let err = absent().predict_body(b"{not json").unwrap_err();
        assert_eq!(err, ServiceError::ModelUnavailable);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(), json!({"error": "Model not loaded"}));
    }

    #[test]
    fn non_numeric_feature_is_inference_error() {
        let err = loaded(0.8).predict(&json!({"BMI": "high"})).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body["error"], "Failed to make a prediction.");
        assert_eq!(body["type"], "NonNumericFeature");
    }

    #[test]
    fn health_states() {
        assert_eq!(
            loaded(0.5).health(),
            Health {
                status: "ok",
                model_loaded: true,
                detail: None
            }
        );
        let health = absent().health();
        assert_eq!(health.status, "error");
        assert!(!health.model_loaded);
        assert!(health.detail.unwrap().contains("no model artifact"));
    }
}
