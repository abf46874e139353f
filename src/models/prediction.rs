//! Prediction model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human-facing risk category, one-to-one with the binary prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    /// 1 -> HIGH, 0 -> LOW. Any other label is not a valid classifier output.
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            1 => Some(Self::High),
            0 => Some(Self::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> u8 {
        match self {
            Self::High => 1,
            Self::Low => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Self::High),
            "LOW" => Ok(Self::Low),
            other => Err(format!("unknown risk level '{}'", other)),
        }
    }
}

/// A persisted scoring decision. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub risk_level: RiskLevel,
    pub fraud_probability: f64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. `created_at` is assigned by the store when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub risk_level: RiskLevel,
    pub fraud_probability: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewPrediction {
    pub fn new(risk_level: RiskLevel, fraud_probability: f64) -> Self {
        Self {
            risk_level,
            fraud_probability,
            created_at: None,
        }
    }

    #[cfg(test)]
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: u8,
    pub risk_label: RiskLevel,
    pub fraud_probability: f64,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct RecentQuery {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<i64>,
}
