//! Batch Pipeline

use crate::records::{ScoredRecord, ScoringResponse, Summary};
use feature_engine::engineer_features;
use inference_engine::{AnomalyModel, FeatureMatrix, InferenceError};
use meter_schema::{normalize_batch, RawRow, SchemaError};
use rule_engine::RuleEngine;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors a batch can fail with. Row-level problems never appear here;
/// they are absorbed during normalization.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// The full scoring pipeline over one immutable model handle
pub struct ScoringPipeline {
    model: Arc<dyn AnomalyModel>,
    rules: RuleEngine,
}

impl ScoringPipeline {
    pub fn new(model: Arc<dyn AnomalyModel>, rules: RuleEngine) -> Self {
        Self { model, rules }
    }

    /// Score one batch of raw rows.
    ///
    /// An empty batch (or one whose every row was dropped) returns an
    /// empty response, not an error; capability failures propagate.
    pub fn score(&self, rows: &[RawRow]) -> Result<ScoringResponse, ScoringError> {
        let readings = normalize_batch(rows)?;
        if readings.is_empty() {
            return Ok(ScoringResponse::default());
        }

        let features = engineer_features(readings);
        let matrix = FeatureMatrix::from_rows(&features);
        let scores = self.model.score(&matrix)?;
        if scores.len() != features.len() {
            return Err(InferenceError::ContractMismatch {
                expected: format!("{} scores", features.len()),
                actual: format!("{} scores", scores.len()),
            }
            .into());
        }

        let context = self.rules.prepare(&features);
        let predictions: Vec<ScoredRecord> = features
            .into_iter()
            .zip(scores)
            .map(|(row, score)| {
                let (anomaly_type, risk_level) =
                    self.rules
                        .classify(&row, &context, score.is_anomaly, score.confidence);
                ScoredRecord {
                    features: row,
                    is_anomaly: score.is_anomaly,
                    confidence: score.confidence,
                    anomaly_type,
                    risk_level,
                }
            })
            .collect();

        let summary = Summary::tally(&predictions);
        info!(
            total = summary.total_records,
            anomalies = summary.anomalies_detected,
            "batch scored"
        );
        Ok(ScoringResponse {
            predictions,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine::ThresholdModel;
    use rule_engine::{AnomalyType, RiskLevel};
    use serde_json::json;

    fn pipeline() -> ScoringPipeline {
        ScoringPipeline::new(Arc::new(ThresholdModel), RuleEngine::default())
    }

    fn rows(value: serde_json::Value) -> Vec<RawRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_empty_batch_is_empty_response() {
        let response = pipeline().score(&[]).unwrap();
        assert!(response.predictions.is_empty());
        assert_eq!(response.summary, Summary::default());
    }

    #[test]
    fn test_spike_batch_end_to_end() {
        let batch = rows(json!([
            {"meter_id": "M1", "date": "2024-01-01", "consumption": 100, "voltage": 230},
            {"meter_id": "M1", "date": "2024-02-01", "consumption": 100, "voltage": 230},
            {"meter_id": "M1", "date": "2024-03-01", "consumption": 400, "voltage": 230}
        ]));
        let response = pipeline().score(&batch).unwrap();
        assert_eq!(response.summary.total_records, 3);
        assert_eq!(response.summary.anomalies_detected, 1);
        assert_eq!(response.summary.normal_readings, 2);
        assert_eq!(response.summary.high_risk_count, 1);

        let spike = response
            .predictions
            .iter()
            .find(|p| p.is_anomaly)
            .unwrap();
        assert_eq!(spike.anomaly_type, AnomalyType::ConsumptionSpike);
        assert_eq!(spike.risk_level, RiskLevel::High);
        assert_eq!(spike.features.delta_units, 300.0);
    }

    #[test]
    fn test_power_factor_example() {
        let batch = rows(json!([
            {"meter_id": "M7", "date": "2024-01-01", "consumption": 100,
             "voltage": 230, "power_factor": 0.6}
        ]));
        let response = pipeline().score(&batch).unwrap();
        let record = &response.predictions[0];
        assert!(record.is_anomaly);
        assert_eq!(record.anomaly_type, AnomalyType::PowerFactorIssue);
        assert_eq!(record.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_short_score_batch_is_contract_mismatch() {
        // a backend returning fewer scores than records is deployment skew
        struct TruncatingModel;
        impl AnomalyModel for TruncatingModel {
            fn score(
                &self,
                matrix: &FeatureMatrix,
            ) -> Result<Vec<inference_engine::ModelScore>, InferenceError> {
                let mut scores = ThresholdModel.score(matrix)?;
                scores.pop();
                Ok(scores)
            }
        }

        let batch = rows(json!([
            {"meter_id": "M1", "date": "2024-01-01", "consumption": 100, "voltage": 230},
            {"meter_id": "M1", "date": "2024-02-01", "consumption": 100, "voltage": 230}
        ]));
        let pipeline = ScoringPipeline::new(Arc::new(TruncatingModel), RuleEngine::default());
        let err = pipeline.score(&batch).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::Inference(InferenceError::ContractMismatch { .. })
        ));
    }

    #[test]
    fn test_unavailable_model_fails_the_batch() {
        let batch = rows(json!([
            {"meter_id": "M1", "date": "2024-01-01", "consumption": 100, "voltage": 230}
        ]));
        let pipeline =
            ScoringPipeline::new(Arc::new(inference_engine::UnavailableModel), RuleEngine::default());
        let err = pipeline.score(&batch).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::Inference(InferenceError::ModelUnavailable)
        ));
    }

    #[test]
    fn test_schema_error_propagates() {
        let batch = rows(json!([
            {"meter_id": "M1", "date": "2024-01-01", "consumption": 100}
        ]));
        let err = pipeline().score(&batch).unwrap_err();
        assert!(matches!(err, ScoringError::Schema(_)));
    }

    #[test]
    fn test_response_serialization_shape() {
        let batch = rows(json!([
            {"meter_id": "M1", "date": "2024-01-01", "consumption": 100, "voltage": 230}
        ]));
        let response = pipeline().score(&batch).unwrap();
        let value = serde_json::to_value(&response).unwrap();
        assert!(value["predictions"].is_array());
        assert_eq!(value["summary"]["total_records"], 1);
        let first = &value["predictions"][0];
        assert_eq!(first["meter_id"], "M1");
        assert_eq!(first["anomaly_type"], "Normal");
        assert_eq!(first["risk_level"], "low");
        assert!(first["rolling_mean"].is_number());
    }
}
