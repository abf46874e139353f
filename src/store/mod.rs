//! Outcome store - persistence of scoring decisions
//!
//! One trait, two backends:
//! - `sqlite` - embedded file-based store (default)
//! - `postgres` - networked relational store, selected by `DATABASE_URL`
//!
//! The backend is chosen once at startup and injected as
//! `Arc<dyn OutcomeStore>`. Both backends bucket days in UTC so they return
//! the same counts and the same trend for the same insert sequence.

pub mod postgres;
pub mod retry;
pub mod sqlite;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, Duration, NaiveDate, Utc};

use crate::config::Config;
use crate::models::{NewPrediction, PredictionRecord, RiskLevel, TrendBucket};

pub use postgres::PostgresStore;
pub use retry::RetryPolicy;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("trend window must be at least one day")]
    EmptyWindow,

    #[error("trend window of {days} days exceeds {max}")]
    WindowTooLarge { days: u32, max: u32 },

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("storage task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Longest trend window served, in days
pub const MAX_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Embedded,
    Networked,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Embedded => "sqlite",
            Backend::Networked => "postgres",
        }
    }
}

#[async_trait]
pub trait OutcomeStore: Send + Sync {
    fn backend(&self) -> Backend;

    /// Create the `predictions` table if absent. Safe on every start.
    async fn init_schema(&self) -> StoreResult<()>;

    /// Append one record and return its id
    async fn insert_record(&self, record: NewPrediction) -> StoreResult<i64>;

    async fn count_total(&self) -> StoreResult<i64>;

    async fn count_high_risk(&self) -> StoreResult<i64>;

    /// Per-day counts for days in `[from, to]` that have records, oldest first
    async fn daily_counts(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<TrendBucket>>;

    /// Newest records first
    async fn recent(&self, limit: i64) -> StoreResult<Vec<PredictionRecord>>;

    async fn insert(&self, risk_level: RiskLevel, fraud_probability: f64) -> StoreResult<i64> {
        self.insert_record(NewPrediction::new(risk_level, fraud_probability))
            .await
    }

    /// `(total, high_risk)`
    async fn stats(&self) -> StoreResult<(i64, i64)> {
        let total = self.count_total().await?;
        let high_risk = self.count_high_risk().await?;
        Ok((total, high_risk))
    }

    /// Exactly `window_days` buckets ending today (UTC), zero-filled
    async fn daily_trend(&self, window_days: u32) -> StoreResult<Vec<TrendBucket>> {
        self.daily_trend_ending(Utc::now().date_naive(), window_days)
            .await
    }

    async fn daily_trend_ending(
        &self,
        last_day: NaiveDate,
        window_days: u32,
    ) -> StoreResult<Vec<TrendBucket>> {
        if window_days == 0 {
            return Err(StoreError::EmptyWindow);
        }
        let too_large = StoreError::WindowTooLarge {
            days: window_days,
            max: MAX_WINDOW_DAYS,
        };
        if window_days > MAX_WINDOW_DAYS {
            return Err(too_large);
        }
        let first_day = last_day
            .checked_sub_days(Days::new(u64::from(window_days) - 1))
            .ok_or(too_large)?;
        let counts = self.daily_counts(first_day, last_day).await?;
        Ok(zero_fill(first_day, window_days, &counts))
    }
}

/// Lay sparse per-day counts over a dense run of `days` calendar days.
/// Counts outside the run are ignored.
pub fn zero_fill(first_day: NaiveDate, days: u32, counts: &[TrendBucket]) -> Vec<TrendBucket> {
    let mut buckets: Vec<TrendBucket> = (0..i64::from(days))
        .map(|offset| TrendBucket::empty(first_day + Duration::days(offset)))
        .collect();

    for count in counts {
        let offset = (count.date - first_day).num_days();
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| buckets.get_mut(i)) {
            bucket.total += count.total;
            bucket.high_risk += count.high_risk;
        }
    }

    buckets
}

/// Which backend the configuration asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice {
    Postgres(String),
    Sqlite(PathBuf),
}

/// Pick the backend. Falling back to the embedded store is always logged.
pub fn select_backend(config: &Config) -> BackendChoice {
    let fallback = BackendChoice::Sqlite(config.sqlite_path.clone());

    match config.database_url.as_deref() {
        Some(url) if is_postgres_url(url) => BackendChoice::Postgres(url.to_string()),
        Some(url) => {
            tracing::warn!(
                scheme = url.split("://").next().unwrap_or(""),
                sqlite_path = %config.sqlite_path.display(),
                "DATABASE_URL scheme not supported, falling back to embedded store"
            );
            fallback
        }
        None => {
            if config.is_production() {
                tracing::warn!(
                    sqlite_path = %config.sqlite_path.display(),
                    "DATABASE_URL not set, using embedded store in production"
                );
            } else {
                tracing::info!(
                    sqlite_path = %config.sqlite_path.display(),
                    "DATABASE_URL not set, using embedded store"
                );
            }
            fallback
        }
    }
}

fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

/// Strip credentials from a connection URL for logging
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}

/// Open the configured backend, retrying the connection with backoff
pub async fn connect(config: &Config) -> StoreResult<Arc<dyn OutcomeStore>> {
    let policy = RetryPolicy::new(config.db_connect_retries, config.db_retry_delay);

    match select_backend(config) {
        BackendChoice::Postgres(url) => {
            tracing::info!(database = %redact_url(&url), "Connecting to networked store");
            let max_connections = config.db_max_connections;
            let store = policy
                .run("postgres connect", || PostgresStore::connect(&url, max_connections))
                .await?;
            Ok(Arc::new(store))
        }
        BackendChoice::Sqlite(path) => {
            tracing::info!(path = %path.display(), "Opening embedded store");
            let store = policy
                .run("sqlite open", || {
                    let path = path.clone();
                    async move { SqliteStore::open(path) }
                })
                .await?;
            Ok(Arc::new(store))
        }
    }
}
