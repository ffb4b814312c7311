//! Canonical Meter Reading Record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Flat tariff used to estimate a missing billing amount (units * rate)
pub const DEFAULT_TARIFF_RATE: f64 = 5.0;

/// Billing season reported by the upstream data producers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Monsoon,
}

impl Season {
    /// Parse a season name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "winter" => Some(Season::Winter),
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "monsoon" => Some(Season::Monsoon),
            _ => None,
        }
    }
}

/// One observation for one meter on one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    /// Opaque meter identity, the grouping key for all per-meter statistics
    pub meter_id: String,
    /// Reading date; partitions are sorted ascending by this
    pub date: NaiveDate,
    /// Consumed units; unparseable values coerce to 0
    pub consumption: f64,
    /// Line voltage; `None` until batch-median imputation runs
    pub voltage: Option<f64>,
    /// Line current, defaults to 0 when the producer omits it
    pub current: f64,
    /// Power factor in [0, 1], defaults to 1.0
    pub power_factor: f64,
    /// Billed amount, estimated from consumption when absent
    pub billing_amount: f64,
    /// Total charge, defaults to the billing amount
    pub total_charge: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_parse() {
        assert_eq!(Season::parse("winter"), Some(Season::Winter));
        assert_eq!(Season::parse(" MONSOON "), Some(Season::Monsoon));
        assert_eq!(Season::parse("autumn"), None);
    }
}
