//! Feature Contract
//!
//! The fixed, ordered list of columns the trained classifier was fitted
//! against. Training and serving must agree on this list exactly; the
//! scoring side builds its input matrix from it and treats any drift as
//! a deployment failure, not a data problem.

use crate::features::FeatureRow;

/// Ordered column names of the classifier input vector (contract v1)
pub const FEATURE_CONTRACT: [&str; 13] = [
    "consumption",
    "voltage",
    "current",
    "power_factor",
    "bill_to_usage_ratio",
    "delta_units",
    "rolling_mean",
    "rolling_min",
    "rolling_max",
    "rolling_std",
    "interaction_billing_pf",
    "month_sin",
    "month_cos",
];

/// Position of a contract column, `None` for names outside the contract
pub fn contract_index(name: &str) -> Option<usize> {
    FEATURE_CONTRACT.iter().position(|column| *column == name)
}

impl FeatureRow {
    /// Look up a column by contract name.
    ///
    /// Returns `None` for names this engine does not compute; callers
    /// backfill those with 0 so scoring degrades to "no evidence of
    /// anomaly" instead of aborting.
    pub fn column(&self, name: &str) -> Option<f64> {
        Some(match name {
            "consumption" => self.reading.consumption,
            "voltage" => self.reading.voltage.unwrap_or(0.0),
            "current" => self.reading.current,
            "power_factor" => self.reading.power_factor,
            "bill_to_usage_ratio" => self.bill_to_usage_ratio,
            "delta_units" => self.delta_units,
            "rolling_mean" => self.rolling_mean,
            "rolling_min" => self.rolling_min,
            "rolling_max" => self.rolling_max,
            "rolling_std" => self.rolling_std,
            "interaction_billing_pf" => self.interaction_billing_pf,
            "month_sin" => self.month_sin,
            "month_cos" => self.month_cos,
            _ => return None,
        })
    }
}
