//! Batch scoring models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RiskLevel;

/// One input row, as parsed from the upload
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRow {
    Values(Vec<f64>),
    /// The row could not be read as numbers at all
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RowStatus {
    High,
    Low,
    Error,
}

impl From<RiskLevel> for RowStatus {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::High => Self::High,
            RiskLevel::Low => Self::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowResult {
    /// Zero-based position in the input
    pub row: usize,
    pub status: RowStatus,
    pub fraud_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run totals. `high_risk_percent` is computed over rows that scored,
/// ERROR rows are only counted in `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub high: usize,
    pub low: usize,
    pub errors: usize,
    pub high_risk_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
}

/// Rows stay untyped so one bad cell fails only its own row
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub rows: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub run_id: Uuid,
    pub rows: Vec<RowResult>,
    pub summary: BatchSummary,
}
