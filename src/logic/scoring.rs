//! Scoring - validate, classify, persist

use std::sync::Arc;

use crate::config::PersistencePolicy;
use crate::error::ScoreError;
use crate::models::{PredictResponse, RiskLevel};
use crate::store::OutcomeStore;

use super::classifier::{InferenceEngine, InferenceError};
use super::features;

/// A classification, before persistence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub prediction: u8,
    pub risk_level: RiskLevel,
    /// Percent, 0-100
    pub fraud_probability: f64,
}

/// Result of a single scoring call
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredOutcome {
    pub decision: Decision,
    pub record_id: Option<i64>,
    pub warning: Option<String>,
}

impl From<ScoredOutcome> for PredictResponse {
    fn from(outcome: ScoredOutcome) -> Self {
        PredictResponse {
            prediction: outcome.decision.prediction,
            risk_label: outcome.decision.risk_level,
            fraud_probability: outcome.decision.fraud_probability,
            persisted: outcome.record_id.is_some(),
            record_id: outcome.record_id,
            warning: outcome.warning,
        }
    }
}

pub struct ScoringService {
    engine: Arc<InferenceEngine>,
    store: Arc<dyn OutcomeStore>,
    policy: PersistencePolicy,
}

impl ScoringService {
    pub fn new(
        engine: Arc<InferenceEngine>,
        store: Arc<dyn OutcomeStore>,
        policy: PersistencePolicy,
    ) -> Self {
        Self {
            engine,
            store,
            policy,
        }
    }

    /// Validate and classify. The classifier is never called with a
    /// malformed vector.
    pub fn classify(&self, values: &[f64]) -> Result<Decision, ScoreError> {
        let vector = features::validate(values)?;
        let prediction = self.engine.predict(&vector)?;

        let risk_level = RiskLevel::from_label(prediction.label).ok_or_else(|| {
            InferenceError(format!("label {} is not 0 or 1", prediction.label))
        })?;

        Ok(Decision {
            prediction: risk_level.label(),
            risk_level,
            fraud_probability: prediction.probability * 100.0,
        })
    }

    /// Classify and persist. A store failure always fails the call.
    pub async fn score_and_record(&self, values: &[f64]) -> Result<(Decision, i64), ScoreError> {
        let decision = self.classify(values)?;
        let record_id = self
            .store
            .insert(decision.risk_level, decision.fraud_probability)
            .await?;
        Ok((decision, record_id))
    }

    /// Single-call scoring. Store failures follow the configured policy.
    pub async fn score(&self, values: &[f64]) -> Result<ScoredOutcome, ScoreError> {
        let decision = self.classify(values)?;

        match self
            .store
            .insert(decision.risk_level, decision.fraud_probability)
            .await
        {
            Ok(record_id) => {
                tracing::debug!(
                    record_id,
                    risk_level = %decision.risk_level,
                    fraud_probability = decision.fraud_probability,
                    "Prediction recorded"
                );
                Ok(ScoredOutcome {
                    decision,
                    record_id: Some(record_id),
                    warning: None,
                })
            }
            Err(e) => match self.policy {
                PersistencePolicy::Strict => Err(ScoreError::Persistence(e)),
                PersistencePolicy::Lenient => {
                    tracing::warn!(
                        risk_level = %decision.risk_level,
                        error = %e,
                        "Prediction not recorded, returning decision anyway"
                    );
                    Ok(ScoredOutcome {
                        decision,
                        record_id: None,
                        warning: Some(format!("decision was not recorded: {}", e)),
                    })
                }
            },
        }
    }
}
