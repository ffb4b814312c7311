//! ONNX Model Backend
//!
//! Loads the ONNX export of the trained gradient-boosting classifier
//! once at startup and runs whole batches through tract. The artifact is
//! immutable for the process lifetime; concurrent scoring shares it
//! without locking.

use crate::matrix::FeatureMatrix;
use crate::model::{AnomalyModel, ModelScore};
use crate::InferenceError;
use feature_engine::FEATURE_CONTRACT;
use std::path::Path;
use tract_onnx::prelude::*;

/// Trained theft classifier behind a compiled tract plan
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxModel {
    /// Load and compile the artifact, pinning the input to the Feature
    /// Contract width with a symbolic batch dimension.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let width = FEATURE_CONTRACT.len();
        let mut model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;
        let batch = model.symbols.sym("N");
        model
            .set_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(batch.to_dim(), width.to_dim())),
            )
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;
        let plan = model
            .into_optimized()
            .and_then(|m| m.into_runnable())
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;
        tracing::info!(path = %path.display(), features = width, "classifier artifact loaded");
        Ok(Self { plan })
    }
}

impl AnomalyModel for OnnxModel {
    fn score(&self, matrix: &FeatureMatrix) -> Result<Vec<ModelScore>, InferenceError> {
        let rows = matrix.rows();
        if rows == 0 {
            return Ok(Vec::new());
        }

        let input =
            tract_ndarray::Array2::from_shape_vec((rows, matrix.width()), matrix.data().to_vec())
                .map_err(|e| InferenceError::ContractMismatch {
                    expected: format!("{rows}x{}", matrix.width()),
                    actual: e.to_string(),
                })?;
        let outputs = self
            .plan
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| InferenceError::ScoringFailed(e.to_string()))?;

        let probabilities = extract_probabilities(&outputs, rows)?;
        Ok(probabilities
            .into_iter()
            .map(|p| ModelScore {
                is_anomaly: p >= 0.5,
                confidence: p,
            })
            .collect())
    }
}

/// Pull the positive-class probability column out of the model outputs.
///
/// Converted classifiers emit either a `[n]` probability vector, or a
/// `[n, k]` per-class matrix whose last column is the positive class.
/// Anything else is training/serving skew.
fn extract_probabilities(
    outputs: &TVec<TValue>,
    rows: usize,
) -> Result<Vec<f64>, InferenceError> {
    for output in outputs.iter().rev() {
        let Ok(view) = output.to_array_view::<f32>() else {
            continue;
        };
        match view.ndim() {
            1 if view.len() == rows => {
                return Ok(view.iter().map(|&v| f64::from(v)).collect());
            }
            2 if view.shape()[0] == rows && view.shape()[1] >= 1 => {
                let last = view.shape()[1] - 1;
                return Ok((0..rows).map(|r| f64::from(view[[r, last]])).collect());
            }
            _ => continue,
        }
    }
    Err(InferenceError::ContractMismatch {
        expected: format!("a float output with {rows} rows"),
        actual: outputs
            .iter()
            .map(|o| format!("{:?}", o.shape()))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_class_output_takes_positive_column() {
        // converted classifiers emit labels plus a [n, 2] probability matrix
        let labels = Tensor::from(tract_ndarray::arr1(&[0i64, 1]));
        let probabilities = Tensor::from(tract_ndarray::arr2(&[[0.9f32, 0.1], [0.2, 0.8]]));
        let outputs: TVec<TValue> = tvec!(labels.into(), probabilities.into());

        let extracted = extract_probabilities(&outputs, 2).unwrap();
        assert!((extracted[0] - 0.1).abs() < 1e-6);
        assert!((extracted[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_flat_probability_vector_output() {
        let probabilities = Tensor::from(tract_ndarray::arr1(&[0.3f32, 0.9, 0.1]));
        let outputs: TVec<TValue> = tvec!(probabilities.into());

        let extracted = extract_probabilities(&outputs, 3).unwrap();
        assert_eq!(extracted.len(), 3);
        assert!((extracted[1] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_row_count_skew_is_contract_mismatch() {
        let probabilities = Tensor::from(tract_ndarray::arr2(&[[0.9f32, 0.1]]));
        let outputs: TVec<TValue> = tvec!(probabilities.into());

        let err = extract_probabilities(&outputs, 3).unwrap_err();
        assert!(matches!(err, InferenceError::ContractMismatch { .. }));
    }

    #[test]
    fn test_non_float_outputs_are_contract_mismatch() {
        let labels = Tensor::from(tract_ndarray::arr1(&[0i64, 1]));
        let outputs: TVec<TValue> = tvec!(labels.into());

        let err = extract_probabilities(&outputs, 2).unwrap_err();
        assert!(matches!(err, InferenceError::ContractMismatch { .. }));
    }
}
