//! Batch Normalization
//!
//! Coerces arbitrary row mappings (any key casing, common field synonyms)
//! into `MeterReading`s. One malformed row never aborts the batch: values
//! that fail coercion fall back to field defaults, and only a column that
//! is absent from every row is a schema failure.

use crate::error::SchemaError;
use crate::reading::{MeterReading, Season, DEFAULT_TARIFF_RATE};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::warn;

/// One loosely-typed input row, as received at the boundary
pub type RawRow = Map<String, Value>;

const METER_ID_KEYS: &[&str] = &["meter_id", "rrno", "meter_no"];
const DATE_KEYS: &[&str] = &["date", "reading_date"];
const CONSUMPTION_KEYS: &[&str] = &["consumption", "units"];
const VOLTAGE_KEYS: &[&str] = &["voltage"];
const CURRENT_KEYS: &[&str] = &["current"];
const POWER_FACTOR_KEYS: &[&str] = &["power_factor", "pf"];
const BILLING_KEYS: &[&str] = &["billing_amount", "billing", "bill_amount"];
const TOTAL_KEYS: &[&str] = &["total_charge", "total"];
const SEASON_KEYS: &[&str] = &["season"];

/// Normalize a whole batch of raw rows.
///
/// Fails only when one of the required columns (`meter_id`, `date`,
/// `consumption`, `voltage`) is missing from every row. Rows whose
/// `meter_id` or `date` cannot be read are dropped with a warning.
/// An empty batch normalizes to an empty batch.
pub fn normalize_batch(rows: &[RawRow]) -> Result<Vec<MeterReading>, SchemaError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    for (column, keys) in [
        ("meter_id", METER_ID_KEYS),
        ("date", DATE_KEYS),
        ("consumption", CONSUMPTION_KEYS),
        ("voltage", VOLTAGE_KEYS),
    ] {
        if !column_present(rows, keys) {
            return Err(SchemaError::RequiredColumnMissing(column));
        }
    }

    let mut readings = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row) {
            Some(reading) => readings.push(reading),
            None => warn!(index, "row dropped: unusable meter_id or date"),
        }
    }
    Ok(readings)
}

fn normalize_row(row: &RawRow) -> Option<MeterReading> {
    let meter_id = lookup(row, METER_ID_KEYS).and_then(coerce_id)?;
    let date = lookup(row, DATE_KEYS).and_then(parse_date)?;

    let consumption = lookup(row, CONSUMPTION_KEYS)
        .and_then(coerce_number)
        .unwrap_or(0.0);
    let billing_amount = lookup(row, BILLING_KEYS)
        .and_then(coerce_number)
        .unwrap_or(consumption * DEFAULT_TARIFF_RATE);

    Some(MeterReading {
        meter_id,
        date,
        consumption,
        voltage: lookup(row, VOLTAGE_KEYS).and_then(coerce_number),
        current: lookup(row, CURRENT_KEYS)
            .and_then(coerce_number)
            .unwrap_or(0.0),
        power_factor: lookup(row, POWER_FACTOR_KEYS)
            .and_then(coerce_number)
            .unwrap_or(1.0),
        total_charge: lookup(row, TOTAL_KEYS)
            .and_then(coerce_number)
            .unwrap_or(billing_amount),
        billing_amount,
        season: lookup(row, SEASON_KEYS)
            .and_then(Value::as_str)
            .and_then(Season::parse),
    })
}

/// Find the first non-null value under any of the accepted key spellings
fn lookup<'a>(row: &'a RawRow, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        let found = row
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v);
        if let Some(value) = found {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}

fn column_present(rows: &[RawRow], keys: &[&str]) -> bool {
    rows.iter()
        .any(|row| row.keys().any(|k| keys.iter().any(|key| k.eq_ignore_ascii_case(key))))
}

/// Best-effort numeric coercion: JSON numbers and numeric strings.
/// Everything else is the missing sentinel, never an error.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The two date formats the upstream producers emit
fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d-%m-%Y"))
        .ok()
}
