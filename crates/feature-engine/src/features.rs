//! Per-Partition Feature Engineering

use crate::rolling::RollingWindow;
use chrono::Datelike;
use meter_schema::MeterReading;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::debug;

/// Trailing window size for rolling consumption statistics
pub const ROLLING_WINDOW: usize = 3;

/// A meter reading plus every derived column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(flatten)]
    pub reading: MeterReading,
    pub month_sin: f64,
    pub month_cos: f64,
    /// total_charge / consumption, with division by zero mapped to 0
    pub bill_to_usage_ratio: f64,
    pub interaction_billing_pf: f64,
    pub rolling_mean: f64,
    pub rolling_min: f64,
    pub rolling_max: f64,
    pub rolling_std: f64,
    /// First difference of consumption within the partition, 0 for the
    /// partition's first chronological record
    pub delta_units: f64,
}

/// Median of the voltages present in the batch.
///
/// Computed once over the whole batch and passed into the partition
/// stage as an explicit scalar; an all-missing batch imputes 0.
pub fn median_voltage(readings: &[MeterReading]) -> f64 {
    let mut present: Vec<f64> = readings.iter().filter_map(|r| r.voltage).collect();
    if present.is_empty() {
        return 0.0;
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = present.len();
    if n % 2 == 1 {
        present[n / 2]
    } else {
        (present[n / 2 - 1] + present[n / 2]) / 2.0
    }
}

/// Engineer features for a whole batch.
///
/// Partitions by meter identity, sorts each partition ascending by date
/// (stable, ties keep input order), and walks each partition once with a
/// sliding consumption window. Per-partition chronological order is
/// preserved in the output; cross-partition order is unspecified.
pub fn engineer_features(readings: Vec<MeterReading>) -> Vec<FeatureRow> {
    if readings.is_empty() {
        return Vec::new();
    }

    let median = median_voltage(&readings);

    let mut partitions: BTreeMap<String, Vec<MeterReading>> = BTreeMap::new();
    for mut reading in readings {
        if reading.voltage.is_none() {
            reading.voltage = Some(median);
        }
        partitions
            .entry(reading.meter_id.clone())
            .or_default()
            .push(reading);
    }

    let mut rows = Vec::new();
    for (meter_id, mut partition) in partitions {
        partition.sort_by_key(|r| r.date);
        debug!(meter_id = %meter_id, records = partition.len(), "engineering partition");

        let mut window = RollingWindow::new(ROLLING_WINDOW);
        let mut previous: Option<f64> = None;
        for reading in partition {
            window.push(reading.consumption);

            let angle = 2.0 * PI * f64::from(reading.date.month()) / 12.0;
            let ratio = reading.total_charge / reading.consumption;
            let delta_units = previous.map_or(0.0, |p| reading.consumption - p);
            previous = Some(reading.consumption);

            rows.push(FeatureRow {
                month_sin: angle.sin(),
                month_cos: angle.cos(),
                bill_to_usage_ratio: if ratio.is_finite() { ratio } else { 0.0 },
                interaction_billing_pf: reading.billing_amount * reading.power_factor,
                rolling_mean: window.mean(),
                rolling_min: window.min(),
                rolling_max: window.max(),
                rolling_std: window.std(),
                delta_units,
                reading,
            });
        }
    }
    rows
}
