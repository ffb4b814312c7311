//! Scoring Capability

use crate::matrix::FeatureMatrix;
use crate::InferenceError;
use feature_engine::contract_index;
use serde::{Deserialize, Serialize};

/// Classifier verdict for one record
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelScore {
    /// Hard decision at the 0.5 probability threshold
    pub is_anomaly: bool,
    /// Positive-class (theft) probability in [0, 1]
    pub confidence: f64,
}

/// Narrow capability interface over the trained classifier.
///
/// Scoring covers the whole batch in one call. Implementations must be
/// shareable across concurrent requests as pure reads.
pub trait AnomalyModel: Send + Sync {
    fn score(&self, matrix: &FeatureMatrix) -> Result<Vec<ModelScore>, InferenceError>;
}

/// Fail-closed stand-in used when no artifact is loaded.
///
/// Every call reports unavailability; callers surface an explicit
/// "unavailable" outcome instead of an empty "no anomalies" result.
pub struct UnavailableModel;

impl AnomalyModel for UnavailableModel {
    fn score(&self, _matrix: &FeatureMatrix) -> Result<Vec<ModelScore>, InferenceError> {
        Err(InferenceError::ModelUnavailable)
    }
}

/// Deterministic threshold scorer for tests and development rigs.
///
/// Flags the same conditions the rule layer explains: a consumption
/// spike against the rolling mean, low line voltage, or a poor power
/// factor. Stands in for the trained artifact when none is present.
pub struct ThresholdModel;

impl ThresholdModel {
    const ANOMALOUS_CONFIDENCE: f64 = 0.95;
    const NORMAL_CONFIDENCE: f64 = 0.05;
}

impl AnomalyModel for ThresholdModel {
    fn score(&self, matrix: &FeatureMatrix) -> Result<Vec<ModelScore>, InferenceError> {
        let column = |name: &str| {
            contract_index(name).ok_or_else(|| InferenceError::ContractMismatch {
                expected: name.to_string(),
                actual: "column absent from contract".to_string(),
            })
        };
        let consumption = column("consumption")?;
        let rolling_mean = column("rolling_mean")?;
        let voltage = column("voltage")?;
        let power_factor = column("power_factor")?;

        let mut scores = Vec::with_capacity(matrix.rows());
        for index in 0..matrix.rows() {
            let row = matrix.row(index);
            let mean = f64::from(row[rolling_mean]);
            let suspicious = (mean > 0.0 && f64::from(row[consumption]) >= 2.0 * mean)
                || f64::from(row[voltage]) < 200.0
                || f64::from(row[power_factor]) < 0.7;
            let confidence = if suspicious {
                Self::ANOMALOUS_CONFIDENCE
            } else {
                Self::NORMAL_CONFIDENCE
            };
            scores.push(ModelScore {
                is_anomaly: suspicious,
                confidence,
            });
        }
        Ok(scores)
    }
}
