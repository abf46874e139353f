//! Batch scoring handlers

use axum::{extract::State, Json};
use uuid::Uuid;

use crate::logic::batch;
use crate::models::{BatchProgress, BatchRequest, BatchResponse, BatchRow};
use crate::error::AppJson;
use crate::{AppError, AppResult, AppState};

const PROGRESS_LOG_EVERY: usize = 100;

/// Score rows given as JSON arrays
pub async fn score_json(
    State(state): State<AppState>,
    AppJson(req): AppJson<BatchRequest>,
) -> AppResult<Json<BatchResponse>> {
    let rows = batch::parse_json_rows(req.rows);
    Ok(Json(run(&state, rows).await))
}

/// Score a CSV upload (`text/csv` body, optional header line)
pub async fn score_csv(State(state): State<AppState>, body: String) -> AppResult<Json<BatchResponse>> {
    let rows = batch::parse_csv(&body);
    if rows.is_empty() {
        return Err(AppError::BadRequest("CSV contains no data rows".to_string()));
    }
    Ok(Json(run(&state, rows).await))
}

async fn run(state: &AppState, rows: Vec<BatchRow>) -> BatchResponse {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, rows = rows.len(), "Batch run started");

    let (rows, summary) = batch::score_rows(&state.scorer, rows, |p: BatchProgress| {
        if p.processed % PROGRESS_LOG_EVERY == 0 && p.processed < p.total {
            tracing::info!(%run_id, processed = p.processed, total = p.total, "Batch progress");
        }
    })
    .await;

    tracing::info!(
        %run_id,
        total = summary.total_rows,
        high = summary.high,
        low = summary.low,
        errors = summary.errors,
        "Batch run finished"
    );

    BatchResponse {
        run_id,
        rows,
        summary,
    }
}
