//! Classifier Adapter
//!
//! Wraps the trained theft classifier behind a narrow scoring capability
//! so the feature and rule layers never touch a model runtime directly.
//! The production backend loads an ONNX export of the trained
//! gradient-boosting model via tract.

mod matrix;
mod model;
mod onnx;

pub use matrix::FeatureMatrix;
pub use model::{AnomalyModel, ModelScore, ThresholdModel, UnavailableModel};
pub use onnx::OnnxModel;

use thiserror::Error;

/// Errors during model load and scoring
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Artifact could not be read or compiled
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// No trained model is loaded; scoring fails closed until reload
    #[error("no trained model is available")]
    ModelUnavailable,

    /// Feature vector shape does not match what the artifact was trained
    /// on. A deployment bug, never a data problem.
    #[error("feature contract mismatch: expected {expected}, got {actual}")]
    ContractMismatch { expected: String, actual: String },

    /// The model runtime rejected a well-formed batch
    #[error("scoring failed: {0}")]
    ScoringFailed(String),
}
