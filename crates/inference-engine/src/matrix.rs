//! Contract-Ordered Feature Matrix

use feature_engine::{FeatureRow, FEATURE_CONTRACT};
use tracing::warn;

/// Row-major f32 matrix with columns in Feature Contract order
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    data: Vec<f32>,
    rows: usize,
}

impl FeatureMatrix {
    /// Build the classifier input from engineered rows.
    ///
    /// Columns the engine did not compute, and non-finite values, are
    /// backfilled with 0 and logged as a data-quality signal. Missing
    /// derived signal degrades to "no evidence", it never aborts.
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * FEATURE_CONTRACT.len());
        let mut backfilled: Vec<&str> = Vec::new();

        for row in rows {
            for column in FEATURE_CONTRACT {
                match row.column(column) {
                    Some(value) if value.is_finite() => data.push(value as f32),
                    Some(_) => data.push(0.0),
                    None => {
                        if !backfilled.contains(&column) {
                            backfilled.push(column);
                        }
                        data.push(0.0);
                    }
                }
            }
        }
        for column in backfilled {
            warn!(column, "contract column missing from engineered rows, backfilled with 0");
        }

        Self {
            data,
            rows: rows.len(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        FEATURE_CONTRACT.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row-major values, `rows * width` long
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// One record's contract-ordered vector
    pub fn row(&self, index: usize) -> &[f32] {
        let width = self.width();
        &self.data[index * width..(index + 1) * width]
    }
}
