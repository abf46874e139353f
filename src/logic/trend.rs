//! Trend Aggregator

use crate::models::{StatsResponse, TrendBucket, TrendPoint};
use crate::store::{OutcomeStore, StoreResult};

/// Share of HIGH decisions, in percent. Zero when nothing was scored.
pub fn fraud_rate(high_risk: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    high_risk as f64 / total as f64 * 100.0
}

pub fn with_rates(buckets: Vec<TrendBucket>) -> Vec<TrendPoint> {
    buckets
        .into_iter()
        .map(|b| TrendPoint {
            date: b.date,
            total: b.total,
            high_risk: b.high_risk,
            fraud_rate: fraud_rate(b.high_risk, b.total),
        })
        .collect()
}

pub async fn stats(store: &dyn OutcomeStore) -> StoreResult<StatsResponse> {
    let (total, high_risk) = store.stats().await?;
    Ok(StatsResponse {
        total,
        high_risk,
        fraud_rate: fraud_rate(high_risk, total),
    })
}

/// `days` consecutive buckets ending today (UTC), oldest first
pub async fn daily_trend(store: &dyn OutcomeStore, days: u32) -> StoreResult<Vec<TrendPoint>> {
    let buckets = store.daily_trend(days).await?;
    Ok(with_rates(buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::store::StoreError;
    use crate::testing::{memory_store, FailingStore};
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_fraud_rate() {
        assert_eq!(fraud_rate(0, 0), 0.0);
        assert_eq!(fraud_rate(2, 3), 2.0 / 3.0 * 100.0);
        assert_eq!(fraud_rate(4, 4), 100.0);
    }

    #[test]
    fn test_rates_follow_buckets() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let points = with_rates(vec![
            TrendBucket::empty(day),
            TrendBucket { date: day.succ_opt().unwrap(), total: 4, high_risk: 1 },
        ]);

        assert_eq!(points[0].fraud_rate, 0.0);
        assert_eq!(points[1].fraud_rate, 25.0);
        assert_eq!(points[1].date, day.succ_opt().unwrap());
    }

    #[tokio::test]
    async fn test_stats_on_empty_store() {
        let store = memory_store().await;
        let stats = stats(store.as_ref()).await.unwrap();
        assert_eq!(stats, StatsResponse { total: 0, high_risk: 0, fraud_rate: 0.0 });
    }

    #[tokio::test]
    async fn test_trend_reflects_todays_inserts() {
        let store = memory_store().await;
        store.insert(RiskLevel::High, 91.0).await.unwrap();
        store.insert(RiskLevel::Low, 3.0).await.unwrap();

        let points = daily_trend(store.as_ref(), 7).await.unwrap();
        assert_eq!(points.len(), 7);

        let today = points.last().unwrap();
        assert_eq!(today.date, Utc::now().date_naive());
        assert_eq!((today.total, today.high_risk), (2, 1));
        assert_eq!(today.fraud_rate, 50.0);
        assert!(points[..6].iter().all(|p| p.total == 0 && p.fraud_rate == 0.0));
    }

    #[tokio::test]
    async fn test_empty_window_rejected() {
        let store = memory_store().await;
        let err = daily_trend(store.as_ref(), 0).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyWindow));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        assert!(stats(&FailingStore).await.is_err());
        assert!(daily_trend(&FailingStore, 3).await.is_err());
    }
}
