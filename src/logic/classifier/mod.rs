//! Classifier Port - trained model behind one interface
//!
//! Artifacts are picked by extension:
//! - `.onnx` - ONNX Runtime session (`onnx.rs`)
//! - `.json` - logistic model weights (`linear.rs`)
//!
//! The model is loaded once at startup. Load failures are fatal
//! (`StartupError`); per-call failures are `InferenceError` and never turn
//! into a default label.

pub mod linear;
pub mod onnx;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use super::features::{FeatureVector, FEATURE_COUNT};
use crate::error::StartupError;

pub use linear::LinearClassifier;
pub use onnx::OnnxClassifier;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

/// Raw classifier output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// 0 = legitimate, 1 = fraudulent
    pub label: u8,
    /// Positive-class probability in [0, 1]
    pub probability: f64,
}

impl Prediction {
    /// Reject anything outside the output contract
    pub fn checked(label: i64, probability: f64) -> Result<Self, InferenceError> {
        let label = match label {
            0 => 0,
            1 => 1,
            other => return Err(InferenceError(format!("label {} is not 0 or 1", other))),
        };
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(InferenceError(format!(
                "probability {} outside [0, 1]",
                probability
            )));
        }
        Ok(Self { label, probability })
    }
}

/// Anything that turns a feature vector into a binary decision.
/// Implementations must be safe to call from many tasks at once.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError>;

    /// Short artifact name for status output
    fn name(&self) -> String;

    fn kind(&self) -> &'static str;
}

/// Engine status for the model endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_name: String,
    pub model_kind: &'static str,
    pub input_features: usize,
    pub avg_latency_ms: f64,
    pub inference_count: u64,
    pub failure_count: u64,
}

/// The loaded classifier plus latency bookkeeping
pub struct InferenceEngine {
    model: Box<dyn Classifier>,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
    failure_count: AtomicU64,
}

impl InferenceEngine {
    pub fn new(model: Box<dyn Classifier>) -> Self {
        Self {
            model,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        }
    }

    /// Load the artifact at `path`, dispatching on its extension
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.exists() {
            return Err(StartupError::ModelNotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let model: Box<dyn Classifier> = match extension.as_deref() {
            Some("onnx") => Box::new(OnnxClassifier::load(path)?),
            Some("json") => Box::new(LinearClassifier::load(path)?),
            _ => {
                return Err(StartupError::UnsupportedModel(path.display().to_string()));
            }
        };

        tracing::info!(
            model = %model.name(),
            kind = model.kind(),
            features = FEATURE_COUNT,
            "Classifier loaded"
        );

        Ok(Self::new(model))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let start = Instant::now();
        let result = self.model.predict(features);

        self.latency_sum_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if result.is_err() {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f64 / count as f64) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_loaded: true,
            model_name: self.model.name(),
            model_kind: self.model.kind(),
            input_features: FEATURE_COUNT,
            avg_latency_ms: avg,
            inference_count: count,
            failure_count: self.failure_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::validate;
    use crate::testing::{test_classifier, FailingClassifier};

    #[test]
    fn test_checked_prediction_contract() {
        assert!(Prediction::checked(1, 0.93).is_ok());
        assert!(Prediction::checked(0, 0.0).is_ok());
        assert!(Prediction::checked(2, 0.5).is_err());
        assert!(Prediction::checked(-1, 0.5).is_err());
        assert!(Prediction::checked(1, 1.01).is_err());
        assert!(Prediction::checked(0, f64::NAN).is_err());
    }

    #[test]
    fn test_missing_artifact_is_startup_error() {
        let result = InferenceEngine::load(Path::new("/nonexistent/fraud_model.onnx"));
        assert!(matches!(result, Err(StartupError::ModelNotFound(_))));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".pkl").tempfile().unwrap();
        let result = InferenceEngine::load(file.path());
        assert!(matches!(result, Err(StartupError::UnsupportedModel(_))));
    }

    #[test]
    fn test_status_counts_calls_and_failures() {
        let features = validate(&[0.0; FEATURE_COUNT]).unwrap();

        let engine = test_classifier();
        engine.predict(&features).unwrap();
        engine.predict(&features).unwrap();
        let status = engine.status();
        assert_eq!(status.inference_count, 2);
        assert_eq!(status.failure_count, 0);
        assert_eq!(status.model_kind, "linear");

        let failing = InferenceEngine::new(Box::new(FailingClassifier));
        assert!(failing.predict(&features).is_err());
        assert_eq!(failing.status().failure_count, 1);
    }
}
