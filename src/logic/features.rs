//! Feature Vector - classifier input
//!
//! Validation is structural only: exactly `FEATURE_COUNT` values, any
//! magnitude. Positional meaning is fixed by the trained model.

use serde::Serialize;

/// Input width of the trained model
pub const FEATURE_COUNT: usize = 29;

/// Display names for the model inputs, in model order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Transaction Velocity Score",
    "Spending Pattern Deviation",
    "Merchant Risk Index",
    "Geolocation Variance Score",
    "Device Risk Fingerprint",
    "Authorization Anomaly Score",
    "Card Usage Irregularity",
    "Time-Based Risk Signal",
    "High-Value Transaction Marker",
    "Behavioral Drift Index",
    "Historical Fraud Correlation",
    "Chargeback Exposure Score",
    "Customer Trust Rating",
    "Purchase Frequency Risk",
    "Account Stability Indicator",
    "Payment Channel Risk",
    "Digital Footprint Strength",
    "Cross-Border Activity Score",
    "Suspicious Activity Probability",
    "Financial Consistency Metric",
    "Transaction Entropy Index",
    "Adaptive Risk Gradient",
    "Cardholder Behavior Variance",
    "AML Compliance Indicator",
    "Fraud Pattern Similarity Score",
    "Identity Verification Risk",
    "Network Risk Exposure",
    "Transaction Confidence Score",
    "Composite Fraud Risk Index",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("expected {expected} features, got {actual}")]
pub struct InvalidDimension {
    pub expected: usize,
    pub actual: usize,
}

/// A validated feature vector. Only constructible through [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// ONNX models take f32 input
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}

/// Check dimensionality. No side effects, no range checks.
pub fn validate(values: &[f64]) -> Result<FeatureVector, InvalidDimension> {
    let values: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| InvalidDimension {
        expected: FEATURE_COUNT,
        actual: values.len(),
    })?;
    Ok(FeatureVector { values })
}
