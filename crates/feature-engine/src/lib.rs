//! Temporal Feature Engine
//!
//! Turns normalized meter readings into the engineered feature rows the
//! theft classifier consumes: per-meter rolling statistics, consumption
//! deltas, cyclical month encoding, and billing interaction features.

mod contract;
mod features;
mod rolling;

pub use contract::{contract_index, FEATURE_CONTRACT};
pub use features::{engineer_features, median_voltage, FeatureRow, ROLLING_WINDOW};
pub use rolling::RollingWindow;
