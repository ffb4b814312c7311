//! Prediction Route

use axum::{extract::State, Json};
use metrics::counter;
use scoring::{RawRow, ScoringResponse};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Score one batch of raw meter-reading rows.
///
/// Returns the full scored response, 400 for a batch missing a required
/// column, and 503 while no model is loaded (even for an empty batch,
/// which would otherwise short-circuit before reaching the model). An
/// empty batch on a healthy service is a valid empty response.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<RawRow>>,
) -> Result<Json<ScoringResponse>, ApiError> {
    if !state.model_loaded {
        return Err(ApiError::ModelUnavailable);
    }
    let response = state.scorer.score(&rows)?;

    counter!("gridwatch_batches_scored_total").increment(1);
    counter!("gridwatch_records_scored_total")
        .increment(response.summary.total_records as u64);
    counter!("gridwatch_anomalies_detected_total")
        .increment(response.summary.anomalies_detected as u64);

    Ok(Json(response))
}
