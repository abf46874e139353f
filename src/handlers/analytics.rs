//! Stats, trend and recent-decision handlers

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::logic::trend;
use crate::models::{PredictionRecord, RecentQuery, StatsResponse, TrendPoint, TrendQuery};
use crate::{AppResult, AppState};

const DEFAULT_RECENT_LIMIT: i64 = 20;

pub async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let stats = trend::stats(state.store.as_ref()).await?;
    Ok(Json(stats))
}

/// Daily buckets ending today, `days` defaults to the configured window
pub async fn daily_trend(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<Vec<TrendPoint>>> {
    query.validate()?;
    let days = query.days.unwrap_or(state.config.trend_days);
    let points = trend::daily_trend(state.store.as_ref(), days).await?;
    Ok(Json(points))
}

/// Most recent decisions, newest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<PredictionRecord>>> {
    query.validate()?;
    let records = state
        .store
        .recent(query.limit.unwrap_or(DEFAULT_RECENT_LIMIT))
        .await?;
    Ok(Json(records))
}
