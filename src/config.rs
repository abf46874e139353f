//! Configuration module

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::store::MAX_WINDOW_DAYS;

/// What the scoring endpoint does when a decision cannot be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistencePolicy {
    /// Fail the call with a persistence error (503)
    #[default]
    Strict,
    /// Return the decision anyway, flagged as unpersisted with a warning
    Lenient,
}

impl FromStr for PersistencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown persistence policy '{}'", other)),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl LogFormat {
    /// Read `LOG_FORMAT` on its own so logging can start before the rest of
    /// the configuration is parsed.
    pub fn from_env() -> Self {
        parse_or("LOG_FORMAT", Self::Pretty)
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Networked backend connection URL. Unset means the embedded backend.
    pub database_url: Option<String>,

    /// Embedded backend database file
    pub sqlite_path: PathBuf,

    /// Classifier artifact (.onnx or .json)
    pub model_path: PathBuf,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Scoring endpoint behaviour on store failure
    pub persistence_policy: PersistencePolicy,

    /// Default trend window in days
    pub trend_days: u32,

    /// Postgres pool size
    pub db_max_connections: u32,

    /// Retries for the initial store connection
    pub db_connect_retries: u32,

    /// Initial backoff between connection attempts
    pub db_retry_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .ok()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),

            sqlite_path: env::var("SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("fraud_app.db")),

            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("fraud_model.onnx")),

            port: parse_or("PORT", 8000),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            persistence_policy: parse_or("PERSISTENCE_POLICY", PersistencePolicy::Strict),

            trend_days: parse_or("TREND_DAYS", 14).clamp(1, MAX_WINDOW_DAYS),

            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),

            db_connect_retries: parse_or("DB_CONNECT_RETRIES", 3),

            db_retry_delay: Duration::from_millis(parse_or("DB_RETRY_DELAY_MS", 500)),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            sqlite_path: PathBuf::from("fraud_app.db"),
            model_path: PathBuf::from("fraud_model.onnx"),
            port: 8000,
            environment: "development".to_string(),
            persistence_policy: PersistencePolicy::Strict,
            trend_days: 14,
            db_max_connections: 10,
            db_connect_retries: 3,
            db_retry_delay: Duration::from_millis(500),
        }
    }
}

/// Parse an env var, keeping the default when unset. Unparseable values are
/// logged and ignored.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration value");
            default
        }),
        Err(_) => default,
    }
}
