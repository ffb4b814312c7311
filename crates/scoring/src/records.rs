//! Scored Records and Batch Summary

use feature_engine::FeatureRow;
use rule_engine::{AnomalyType, RiskLevel};
use serde::{Deserialize, Serialize};

/// One fully annotated record: original fields, derived columns,
/// classifier output, and rule verdicts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub features: FeatureRow,
    pub is_anomaly: bool,
    pub confidence: f64,
    pub anomaly_type: AnomalyType,
    pub risk_level: RiskLevel,
}

/// Batch aggregate. Risk-tier counts cover anomalous records only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_records: usize,
    pub anomalies_detected: usize,
    pub normal_readings: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
}

impl Summary {
    pub fn tally(records: &[ScoredRecord]) -> Self {
        let mut summary = Summary {
            total_records: records.len(),
            ..Summary::default()
        };
        for record in records {
            if !record.is_anomaly {
                summary.normal_readings += 1;
                continue;
            }
            summary.anomalies_detected += 1;
            match record.risk_level {
                RiskLevel::High => summary.high_risk_count += 1,
                RiskLevel::Medium => summary.medium_risk_count += 1,
                RiskLevel::Low => summary.low_risk_count += 1,
            }
        }
        summary
    }
}

/// The boundary response shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringResponse {
    pub predictions: Vec<ScoredRecord>,
    pub summary: Summary,
}
