//! Meter Reading Schema
//!
//! Canonical typed records for utility-meter readings, plus a tolerant
//! normalizer that coerces loosely-typed upstream rows into them.

mod error;
mod normalizer;
mod reading;

pub use error::SchemaError;
pub use normalizer::{normalize_batch, RawRow};
pub use reading::{MeterReading, Season, DEFAULT_TARIFF_RATE};
