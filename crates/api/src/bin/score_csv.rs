//! Offline CSV batch scorer.
//!
//! Scores a tabular readings file through the same pipeline as the API
//! and prints the JSON response.

use anyhow::Context;
use api::Settings;
use inference_engine::OnnxModel;
use rule_engine::RuleEngine;
use scoring::{RawRow, ScoringPipeline};
use serde_json::Value;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    api::init_logging();

    let path = std::env::args()
        .nth(1)
        .context("usage: score-csv <readings.csv>")?;
    let settings = Settings::load()?;

    let model = OnnxModel::load(&settings.model_path)
        .with_context(|| format!("loading {}", settings.model_path.display()))?;
    let pipeline = ScoringPipeline::new(Arc::new(model), RuleEngine::new(settings.rules.clone()));

    let mut reader = csv::Reader::from_path(&path).with_context(|| format!("reading {path}"))?;
    let headers = reader.headers()?.clone();
    let mut rows: Vec<RawRow> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(row);
    }

    let response = pipeline.score(&rows)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
