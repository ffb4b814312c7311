//! Rule Evaluation

use feature_engine::FeatureRow;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rule thresholds. Deployment policy, tunable without retraining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Consumption spike multiplier against the rolling mean
    #[serde(default = "default_spike_multiplier")]
    pub spike_multiplier: f64,
    /// Low-voltage threshold in volts
    #[serde(default = "default_low_voltage")]
    pub low_voltage: f64,
    /// Power factor floor
    #[serde(default = "default_power_factor_floor")]
    pub power_factor_floor: f64,
    /// Batch quantile of bill_to_usage_ratio above which billing mismatches fire
    #[serde(default = "default_billing_ratio_quantile")]
    pub billing_ratio_quantile: f64,
    /// Confidence above which an anomaly is high risk
    #[serde(default = "default_high_risk_confidence")]
    pub high_risk_confidence: f64,
    /// Confidence above which an anomaly is medium risk
    #[serde(default = "default_medium_risk_confidence")]
    pub medium_risk_confidence: f64,
}

fn default_spike_multiplier() -> f64 {
    2.0
}
fn default_low_voltage() -> f64 {
    200.0
}
fn default_power_factor_floor() -> f64 {
    0.7
}
fn default_billing_ratio_quantile() -> f64 {
    0.9
}
fn default_high_risk_confidence() -> f64 {
    0.9
}
fn default_medium_risk_confidence() -> f64 {
    0.8
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            spike_multiplier: default_spike_multiplier(),
            low_voltage: default_low_voltage(),
            power_factor_floor: default_power_factor_floor(),
            billing_ratio_quantile: default_billing_ratio_quantile(),
            high_risk_confidence: default_high_risk_confidence(),
            medium_risk_confidence: default_medium_risk_confidence(),
        }
    }
}

/// Mutually exclusive anomaly category; serialized with the labels the
/// dashboard consumers expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyType {
    Normal,
    #[serde(rename = "Consumption Spike")]
    ConsumptionSpike,
    #[serde(rename = "Voltage Anomaly")]
    VoltageAnomaly,
    #[serde(rename = "Power Factor Issue")]
    PowerFactorIssue,
    #[serde(rename = "Billing Mismatch")]
    BillingMismatch,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::Normal => "Normal",
            AnomalyType::ConsumptionSpike => "Consumption Spike",
            AnomalyType::VoltageAnomaly => "Voltage Anomaly",
            AnomalyType::PowerFactorIssue => "Power Factor Issue",
            AnomalyType::BillingMismatch => "Billing Mismatch",
        }
    }
}

/// Ordinal risk tier derived from classifier confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Batch-level inputs the per-record rules need
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    /// Configured quantile of bill_to_usage_ratio across the batch
    pub billing_ratio_cutoff: f64,
}

/// Ordered, mutually-exclusive rule evaluation
pub struct RuleEngine {
    config: RuleConfig,
}

impl RuleEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Precompute the batch-wide billing-ratio cutoff
    pub fn prepare(&self, rows: &[FeatureRow]) -> RuleContext {
        let cutoff = percentile(
            rows.iter().map(|r| r.bill_to_usage_ratio),
            self.config.billing_ratio_quantile,
        );
        debug!(cutoff, "billing ratio cutoff prepared");
        RuleContext {
            billing_ratio_cutoff: cutoff,
        }
    }

    /// Assign the anomaly category and risk tier for one record.
    ///
    /// Rules run in a fixed order and the first match wins; that order
    /// is the tie-break policy. Records the classifier did not flag are
    /// always Normal/low.
    pub fn classify(
        &self,
        row: &FeatureRow,
        context: &RuleContext,
        is_anomaly: bool,
        confidence: f64,
    ) -> (AnomalyType, RiskLevel) {
        if !is_anomaly {
            return (AnomalyType::Normal, RiskLevel::Low);
        }

        let anomaly_type = if row.rolling_mean > 0.0
            && row.reading.consumption >= self.config.spike_multiplier * row.rolling_mean
        {
            AnomalyType::ConsumptionSpike
        } else if row.reading.voltage.unwrap_or(0.0) < self.config.low_voltage {
            AnomalyType::VoltageAnomaly
        } else if row.reading.power_factor < self.config.power_factor_floor {
            AnomalyType::PowerFactorIssue
        } else if row.bill_to_usage_ratio > context.billing_ratio_cutoff {
            AnomalyType::BillingMismatch
        } else {
            AnomalyType::Normal
        };

        (anomaly_type, self.risk_level(confidence))
    }

    /// Risk tier from confidence alone
    pub fn risk_level(&self, confidence: f64) -> RiskLevel {
        if confidence > self.config.high_risk_confidence {
            RiskLevel::High
        } else if confidence > self.config.medium_risk_confidence {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

/// Linear-interpolation percentile over the finite values
fn percentile(values: impl Iterator<Item = f64>, q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (position - lower as f64) * (sorted[upper] - sorted[lower])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use meter_schema::MeterReading;

    fn feature_row(consumption: f64, rolling_mean: f64, voltage: f64, pf: f64, ratio: f64) -> FeatureRow {
        FeatureRow {
            reading: MeterReading {
                meter_id: "M1".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                consumption,
                voltage: Some(voltage),
                current: 1.0,
                power_factor: pf,
                billing_amount: consumption * 5.0,
                total_charge: consumption * 5.0,
                season: None,
            },
            month_sin: 0.5,
            month_cos: 0.86,
            bill_to_usage_ratio: ratio,
            interaction_billing_pf: consumption * 5.0 * pf,
            rolling_mean,
            rolling_min: rolling_mean,
            rolling_max: consumption,
            rolling_std: 0.0,
            delta_units: 0.0,
        }
    }

    fn context() -> RuleContext {
        RuleContext {
            billing_ratio_cutoff: 10.0,
        }
    }

    #[test]
    fn test_normal_record_is_always_normal_low() {
        let engine = RuleEngine::default();
        // features that would match every rule, but the classifier said normal
        let row = feature_row(400.0, 100.0, 150.0, 0.5, 99.0);
        let (anomaly_type, risk) = engine.classify(&row, &context(), false, 0.5);
        assert_eq!(anomaly_type, AnomalyType::Normal);
        assert_eq!(risk, RiskLevel::Low);
    }

    #[test]
    fn test_rule_order_spike_beats_voltage() {
        let engine = RuleEngine::default();
        // matches both Consumption Spike and Voltage Anomaly
        let row = feature_row(400.0, 100.0, 150.0, 0.95, 5.0);
        let (anomaly_type, _) = engine.classify(&row, &context(), true, 0.95);
        assert_eq!(anomaly_type, AnomalyType::ConsumptionSpike);
    }

    #[test]
    fn test_voltage_beats_power_factor() {
        let engine = RuleEngine::default();
        let row = feature_row(100.0, 100.0, 150.0, 0.5, 5.0);
        let (anomaly_type, _) = engine.classify(&row, &context(), true, 0.95);
        assert_eq!(anomaly_type, AnomalyType::VoltageAnomaly);
    }

    #[test]
    fn test_power_factor_issue_high_risk() {
        let engine = RuleEngine::default();
        let row = feature_row(100.0, 100.0, 230.0, 0.6, 5.0);
        let (anomaly_type, risk) = engine.classify(&row, &context(), true, 0.95);
        assert_eq!(anomaly_type, AnomalyType::PowerFactorIssue);
        assert_eq!(risk, RiskLevel::High);
    }

    #[test]
    fn test_billing_mismatch_above_cutoff() {
        let engine = RuleEngine::default();
        let row = feature_row(100.0, 100.0, 230.0, 0.95, 42.0);
        let (anomaly_type, _) = engine.classify(&row, &context(), true, 0.85);
        assert_eq!(anomaly_type, AnomalyType::BillingMismatch);
    }

    #[test]
    fn test_flagged_but_no_rule_match_stays_normal() {
        let engine = RuleEngine::default();
        let row = feature_row(100.0, 100.0, 230.0, 0.95, 5.0);
        let (anomaly_type, risk) = engine.classify(&row, &context(), true, 0.85);
        assert_eq!(anomaly_type, AnomalyType::Normal);
        assert_eq!(risk, RiskLevel::Medium);
    }

    #[test]
    fn test_risk_tiers_monotonic_in_confidence() {
        let engine = RuleEngine::default();
        assert_eq!(engine.risk_level(0.95), RiskLevel::High);
        assert_eq!(engine.risk_level(0.85), RiskLevel::Medium);
        assert_eq!(engine.risk_level(0.5), RiskLevel::Low);
        // boundary values do not escalate
        assert_eq!(engine.risk_level(0.9), RiskLevel::Medium);
        assert_eq!(engine.risk_level(0.8), RiskLevel::Low);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let p90 = percentile(values.into_iter(), 0.9);
        assert!((p90 - 9.1).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_empty_is_zero() {
        assert_eq!(percentile(std::iter::empty(), 0.9), 0.0);
    }

    #[test]
    fn test_prepare_uses_batch_ratios() {
        let engine = RuleEngine::default();
        let rows: Vec<FeatureRow> = (1..=10)
            .map(|i| feature_row(100.0, 100.0, 230.0, 0.95, i as f64))
            .collect();
        let ctx = engine.prepare(&rows);
        assert!((ctx.billing_ratio_cutoff - 9.1).abs() < 1e-9);
    }
}
