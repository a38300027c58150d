//! HTTP surface.
//!
//! - `POST /predict`: JSON record in, `{"prediction": 0|1}` out
//! - `GET /health`: `{"status", "model_loaded", "detail"?}`, always 200

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{Health, Prediction, PredictionService, ServiceError};

/// Build the application router.
pub fn router(service: PredictionService) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(service))
}

async fn predict(
    State(service): State<Arc<PredictionService>>,
    body: Bytes,
) -> Result<Json<Prediction>, ServiceError> {
    service.predict_body(&body).map(Json)
}

async fn health(State(service): State<Arc<PredictionService>>) -> Json<Health> {
    Json(service.health())
}
