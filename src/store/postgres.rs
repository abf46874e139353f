//! Networked PostgreSQL backend

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use super::{Backend, OutcomeStore, StoreError, StoreResult};
use crate::models::{NewPrediction, PredictionRecord, TrendBucket};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS predictions (
    id BIGSERIAL PRIMARY KEY,
    risk_level TEXT NOT NULL CHECK (risk_level IN ('HIGH', 'LOW')),
    fraud_probability DOUBLE PRECISION NOT NULL CHECK (fraud_probability >= 0 AND fraud_probability <= 100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at);
"#;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct PredictionRow {
    id: i64,
    risk_level: String,
    fraud_probability: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<PredictionRow> for PredictionRecord {
    type Error = StoreError;

    fn try_from(row: PredictionRow) -> Result<Self, Self::Error> {
        Ok(PredictionRecord {
            id: row.id,
            risk_level: row.risk_level.parse().map_err(StoreError::Corrupt)?,
            fraud_probability: row.fraud_probability,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DayRow {
    day: NaiveDate,
    total: i64,
    high_risk: i64,
}

impl PostgresStore {
    /// Create the connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// UTC midnight at the start of `day`
fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

#[async_trait]
impl OutcomeStore for PostgresStore {
    fn backend(&self) -> Backend {
        Backend::Networked
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;

        tracing::info!(backend = "postgres", "Database schema applied successfully");
        Ok(())
    }

    async fn insert_record(&self, record: NewPrediction) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO predictions (risk_level, fraud_probability, created_at)
            VALUES ($1, $2, COALESCE($3, NOW()))
            RETURNING id
            "#,
        )
        .bind(record.risk_level.as_str())
        .bind(record.fraud_probability)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn count_total(&self) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM predictions")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn count_high_risk(&self) -> StoreResult<i64> {
        let high_risk =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM predictions WHERE risk_level = 'HIGH'")
                .fetch_one(&self.pool)
                .await?;
        Ok(high_risk)
    }

    async fn daily_counts(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<TrendBucket>> {
        let rows = sqlx::query_as::<_, DayRow>(
            r#"
            SELECT
                (created_at AT TIME ZONE 'UTC')::date AS day,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE risk_level = 'HIGH') AS high_risk
            FROM predictions
            WHERE created_at >= $1 AND created_at < $2
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(day_start(from))
        .bind(day_start(to + Duration::days(1)))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TrendBucket {
                date: r.day,
                total: r.total,
                high_risk: r.high_risk,
            })
            .collect())
    }

    async fn recent(&self, limit: i64) -> StoreResult<Vec<PredictionRecord>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT id, risk_level, fraud_probability, created_at
            FROM predictions
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PredictionRecord::try_from).collect()
    }
}
