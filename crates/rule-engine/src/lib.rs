//! Anomaly Rule Engine
//!
//! Transparent, auditable layer on top of the opaque classifier score:
//! maps flagged records to a single anomaly category and a risk tier.
//! Thresholds live in configuration so deployments can tune them
//! without retraining the model.

mod rules;

pub use rules::{AnomalyType, RiskLevel, RuleConfig, RuleContext, RuleEngine};
