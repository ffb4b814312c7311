//! Schema Error Types

use thiserror::Error;

/// Errors during batch normalization
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// A required column is absent from every row of the batch.
    /// Per-row problems never raise this; they are defaulted or dropped.
    #[error("required column '{0}' is missing from every row")]
    RequiredColumnMissing(&'static str),
}
