//! Scoring endpoint

use axum::{extract::State, Json};

use crate::error::AppJson;
use crate::models::{PredictRequest, PredictResponse};
use crate::{AppResult, AppState};

/// Score one feature vector and record the decision
pub async fn predict(
    State(state): State<AppState>,
    AppJson(req): AppJson<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let outcome = state.scorer.score(&req.features).await?;
    Ok(Json(outcome.into()))
}
