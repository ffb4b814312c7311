//! Scoring Pipeline
//!
//! Runs normalization, feature engineering, classification, and rule
//! annotation over one batch, and assembles the response with its
//! summary. One batch in, one response out, no state across batches.

mod pipeline;
mod records;

pub use meter_schema::RawRow;
pub use pipeline::{ScoringError, ScoringPipeline};
pub use records::{ScoredRecord, ScoringResponse, Summary};
