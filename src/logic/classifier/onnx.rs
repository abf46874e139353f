//! ONNX Runtime classifier.
//!
//! Expects a binary classifier export with a `label` output (int64) and a
//! probability tensor output of shape `[1, 2]` (class 1 = fraud) or `[1, 1]`.
//! Exports that emit probabilities as `seq(map)` must be converted with the
//! zipmap step disabled. Without a label output, label = probability >= 0.5.

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::{Classifier, InferenceError, Prediction};
use crate::error::StartupError;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

pub struct OnnxClassifier {
    name: String,
    /// `run` needs exclusive access to the session
    session: Mutex<Session>,
    label_output: Option<String>,
    probability_output: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        tracing::info!(path = %path.display(), "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| StartupError::InvalidModel(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| StartupError::InvalidModel(format!("optimization level: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| StartupError::InvalidModel(format!("{}: {}", path.display(), e)))?;

        if session.inputs.is_empty() {
            return Err(StartupError::InvalidModel("model declares no inputs".to_string()));
        }

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let label_output = output_names.iter().find(|n| n.contains("label")).cloned();
        let probability_output = output_names
            .iter()
            .find(|n| n.contains("prob"))
            .or_else(|| output_names.iter().rev().find(|n| Some(*n) != label_output.as_ref()))
            .cloned()
            .ok_or_else(|| StartupError::InvalidModel("no probability output".to_string()))?;

        tracing::info!(
            label_output = ?label_output,
            probability_output = %probability_output,
            "ONNX model loaded successfully"
        );

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "onnx".to_string()),
            session: Mutex::new(session),
            label_output,
            probability_output,
        })
    }
}

/// Positive-class probability from a `[batch, classes]` or `[classes]` tensor
pub(crate) fn fraud_probability(dims: &[i64], data: &[f32]) -> Result<f64, InferenceError> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => return Err(InferenceError(format!("unexpected probability shape {:?}", dims))),
    };

    let value = match classes {
        1 => data.first(),
        c if c >= 2 => data.get(1),
        _ => None,
    };

    value
        .map(|&p| f64::from(p))
        .ok_or_else(|| InferenceError(format!("empty probability tensor {:?}", dims)))
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let input_array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), features.to_f32())
            .map_err(|e| InferenceError(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let probability = {
            let output = outputs
                .get(&self.probability_output)
                .ok_or_else(|| InferenceError("No probability output".to_string()))?;
            let (shape, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;
            let dims: Vec<i64> = shape.iter().copied().collect();
            fraud_probability(&dims, data)?
        };

        let label = match &self.label_output {
            Some(name) => {
                let output = outputs
                    .get(name)
                    .ok_or_else(|| InferenceError("No label output".to_string()))?;
                let (_, data) = output
                    .try_extract_tensor::<i64>()
                    .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;
                *data
                    .first()
                    .ok_or_else(|| InferenceError("Empty label tensor".to_string()))?
            }
            None => i64::from(probability >= 0.5),
        };

        Prediction::checked(label, probability)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_class_tensor_uses_fraud_column() {
        assert_eq!(fraud_probability(&[1, 2], &[0.25, 0.75]).unwrap(), 0.75);
        assert_eq!(fraud_probability(&[2], &[0.9, 0.1]).unwrap(), f64::from(0.1f32));
    }

    #[test]
    fn test_single_probability_tensor() {
        assert_eq!(fraud_probability(&[1, 1], &[0.5]).unwrap(), 0.5);
    }

    #[test]
    fn test_bad_shapes_are_errors() {
        assert!(fraud_probability(&[1, 2, 3], &[0.0; 6]).is_err());
        assert!(fraud_probability(&[1, 2], &[]).is_err());
        assert!(fraud_probability(&[1, 0], &[]).is_err());
    }
}
