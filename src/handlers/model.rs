//! Model info handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::logic::classifier::EngineStatus;
use crate::logic::features::FEATURE_NAMES;
use crate::AppState;

#[derive(Serialize)]
pub struct ModelInfo {
    #[serde(flatten)]
    status: EngineStatus,
    store_backend: &'static str,
    feature_names: &'static [&'static str],
}

pub async fn info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(ModelInfo {
        status: state.engine.status(),
        store_backend: state.store.backend().as_str(),
        feature_names: &FEATURE_NAMES,
    })
}
