//! Embedded SQLite backend.
//!
//! One connection behind a mutex; every call runs on the blocking pool so
//! async callers are never stalled on disk I/O. Timestamps are stored as
//! UTC text (`YYYY-MM-DD HH:MM:SS.fff`), which sorts chronologically.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use super::{Backend, OutcomeStore, StoreError, StoreResult};
use crate::models::{NewPrediction, PredictionRecord, RiskLevel, TrendBucket};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    risk_level TEXT NOT NULL CHECK (risk_level IN ('HIGH', 'LOW')),
    fraud_probability REAL NOT NULL CHECK (fraud_probability >= 0 AND fraud_probability <= 100),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at);
"#;

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        // WAL: readers don't block the writer
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self::from_connection(conn))
    }

    /// In-memory database, used in tests
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::Corrupt(format!("created_at '{}': {}", raw, e)))
}

#[async_trait]
impl OutcomeStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Embedded
    }

    async fn init_schema(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA_SQL)?;
            Ok(())
        })
        .await?;

        tracing::info!(backend = "sqlite", "Database schema applied successfully");
        Ok(())
    }

    async fn insert_record(&self, record: NewPrediction) -> StoreResult<i64> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO predictions (risk_level, fraud_probability, created_at)
                 VALUES (?1, ?2, COALESCE(?3, strftime('%Y-%m-%d %H:%M:%f', 'now')))",
                params![
                    record.risk_level.as_str(),
                    record.fraud_probability,
                    record.created_at.map(format_timestamp),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn count_total(&self) -> StoreResult<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?)
        })
        .await
    }

    async fn count_high_risk(&self) -> StoreResult<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM predictions WHERE risk_level = 'HIGH'",
                [],
                |row| row.get(0),
            )?)
        })
        .await
    }

    async fn daily_counts(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<TrendBucket>> {
        let lower = from.format(DATE_FORMAT).to_string();
        let upper = (to + Duration::days(1)).format(DATE_FORMAT).to_string();

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT substr(created_at, 1, 10) AS day,
                        COUNT(*),
                        SUM(CASE WHEN risk_level = 'HIGH' THEN 1 ELSE 0 END)
                 FROM predictions
                 WHERE created_at >= ?1 AND created_at < ?2
                 GROUP BY day
                 ORDER BY day ASC",
            )?;
            let rows = stmt
                .query_map(params![lower, upper], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(day, total, high_risk)| {
                    let date = NaiveDate::parse_from_str(&day, DATE_FORMAT)
                        .map_err(|e| StoreError::Corrupt(format!("day '{}': {}", day, e)))?;
                    Ok(TrendBucket {
                        date,
                        total,
                        high_risk,
                    })
                })
                .collect()
        })
        .await
    }

    async fn recent(&self, limit: i64) -> StoreResult<Vec<PredictionRecord>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, risk_level, fraud_probability, created_at
                 FROM predictions ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(id, level, fraud_probability, created_at)| {
                    Ok(PredictionRecord {
                        id,
                        risk_level: level.parse::<RiskLevel>().map_err(StoreError::Corrupt)?,
                        fraud_probability,
                        created_at: parse_timestamp(&created_at)?,
                    })
                })
                .collect()
        })
        .await
    }
}
