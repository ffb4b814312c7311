//! Boundary Error Mapping
//!
//! Distinguishes "no data" (a valid empty response), "malformed input",
//! and "service unavailable" at the HTTP boundary. A capability failure
//! is never surfaced as an empty result.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use inference_engine::InferenceError;
use scoring::ScoringError;
use serde_json::json;
use thiserror::Error;

/// Request-level failures
#[derive(Debug, Error)]
pub enum ApiError {
    /// The artifact never loaded; the service is degraded
    #[error("no trained model is available")]
    ModelUnavailable,

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Scoring(ScoringError::Schema(_)) => StatusCode::BAD_REQUEST,
            ApiError::Scoring(ScoringError::Inference(InferenceError::ModelUnavailable)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Scoring(ScoringError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
