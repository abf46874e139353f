//! Logistic model loaded from JSON weights.
//!
//! ```json
//! { "weights": [29 numbers], "bias": -1.2, "threshold": 0.5 }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::{Classifier, InferenceError, Prediction};
use crate::error::StartupError;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
struct LinearArtifact {
    weights: Vec<f64>,
    bias: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

#[derive(Debug, Clone)]
pub struct LinearClassifier {
    name: String,
    weights: [f64; FEATURE_COUNT],
    bias: f64,
    threshold: f64,
}

impl LinearClassifier {
    pub fn new(
        name: impl Into<String>,
        weights: &[f64],
        bias: f64,
        threshold: f64,
    ) -> Result<Self, StartupError> {
        let name = name.into();
        let weights: [f64; FEATURE_COUNT] = weights.try_into().map_err(|_| {
            StartupError::InvalidModel(format!(
                "{}: expected {} weights, got {}",
                name,
                FEATURE_COUNT,
                weights.len()
            ))
        })?;

        if weights.iter().any(|w| !w.is_finite()) || !bias.is_finite() {
            return Err(StartupError::InvalidModel(format!("{}: non-finite weight", name)));
        }
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(StartupError::InvalidModel(format!(
                "{}: threshold {} outside (0, 1)",
                name, threshold
            )));
        }

        Ok(Self {
            name,
            weights,
            bias,
            threshold,
        })
    }

    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StartupError::InvalidModel(format!("{}: {}", path.display(), e)))?;
        let artifact: LinearArtifact = serde_json::from_str(&raw)
            .map_err(|e| StartupError::InvalidModel(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "linear".to_string());

        Self::new(name, &artifact.weights, artifact.bias, artifact.threshold)
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let logit: f64 = self
            .weights
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;

        if !logit.is_finite() {
            return Err(InferenceError(format!("non-finite logit ({})", logit)));
        }

        let probability = 1.0 / (1.0 + (-logit).exp());
        let label = i64::from(probability >= self.threshold);
        Prediction::checked(label, probability)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
