//! Shared test fixtures

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::logic::classifier::{Classifier, InferenceEngine, InferenceError, LinearClassifier, Prediction};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::models::{NewPrediction, PredictionRecord, TrendBucket};
use crate::store::{Backend, OutcomeStore, SqliteStore, StoreError, StoreResult};

/// Logistic model keyed on the first feature: HIGH when it is above 1
pub fn test_classifier() -> InferenceEngine {
    let mut weights = [0.0; FEATURE_COUNT];
    weights[0] = 1.0;
    let model = LinearClassifier::new("test-model.json", &weights, -1.0, 0.5)
        .expect("valid test weights");
    InferenceEngine::new(Box::new(model))
}

pub fn test_engine() -> Arc<InferenceEngine> {
    Arc::new(test_classifier())
}

pub fn failing_engine() -> Arc<InferenceEngine> {
    Arc::new(InferenceEngine::new(Box::new(FailingClassifier)))
}

pub fn high_risk_row() -> Vec<f64> {
    let mut row = vec![0.0; FEATURE_COUNT];
    row[0] = 5.0;
    row
}

pub fn low_risk_row() -> Vec<f64> {
    vec![0.0; FEATURE_COUNT]
}

pub async fn memory_store() -> Arc<dyn OutcomeStore> {
    let store = SqliteStore::in_memory().expect("in-memory sqlite");
    store.init_schema().await.expect("schema");
    Arc::new(store)
}

pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<Prediction, InferenceError> {
        Err(InferenceError("model state corrupted".to_string()))
    }

    fn name(&self) -> String {
        "failing".to_string()
    }

    fn kind(&self) -> &'static str {
        "test"
    }
}

/// A store whose backend is unreachable
pub struct FailingStore;

fn offline<T>() -> StoreResult<T> {
    Err(StoreError::Task("store offline".to_string()))
}

#[async_trait]
impl OutcomeStore for FailingStore {
    fn backend(&self) -> Backend {
        Backend::Networked
    }

    async fn init_schema(&self) -> StoreResult<()> {
        offline()
    }

    async fn insert_record(&self, _record: NewPrediction) -> StoreResult<i64> {
        offline()
    }

    async fn count_total(&self) -> StoreResult<i64> {
        offline()
    }

    async fn count_high_risk(&self) -> StoreResult<i64> {
        offline()
    }

    async fn daily_counts(&self, _from: NaiveDate, _to: NaiveDate) -> StoreResult<Vec<TrendBucket>> {
        offline()
    }

    async fn recent(&self, _limit: i64) -> StoreResult<Vec<PredictionRecord>> {
        offline()
    }
}
