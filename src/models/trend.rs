//! Trend and stats models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One calendar day's counts. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    pub date: NaiveDate,
    pub total: i64,
    pub high_risk: i64,
}

impl TrendBucket {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total: 0,
            high_risk: 0,
        }
    }
}

/// A bucket plus its derived fraud rate (percent)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: i64,
    pub high_risk: i64,
    pub fraud_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsResponse {
    pub total: i64,
    pub high_risk: i64,
    pub fraud_rate: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TrendQuery {
    #[validate(range(min = 1, max = 365))]
    pub days: Option<u32>,
}
