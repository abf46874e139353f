//! Error handling
//!
//! - `ScoreError`: the per-call taxonomy (validation, inference, persistence)
//! - `StartupError`: fatal, the process must not start serving
//! - `AppError`: HTTP mapping of the above

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::logic::classifier::InferenceError;
use crate::logic::features::InvalidDimension;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// `Json` extractor whose rejections use the `AppError` body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("validation error: {0}")]
    Validation(#[from] InvalidDimension),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl ScoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::Validation(_) => "validation",
            ScoreError::Inference(_) => "inference",
            ScoreError::Persistence(_) => "persistence",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("model artifact not found: {0}")]
    ModelNotFound(String),

    #[error("unsupported model artifact (expected .onnx or .json): {0}")]
    UnsupportedModel(String),

    #[error("invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("store unavailable: {0}")]
    Store(StoreError),

    #[error("schema initialization failed: {0}")]
    Schema(StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Caller errors
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    // Service errors
    #[error("{0}")]
    Inference(String),

    #[error("{0}")]
    Persistence(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::BadRequest(_) => "bad_request",
            AppError::Inference(_) => "inference",
            AppError::Persistence(_) => "persistence",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Inference(msg) => {
                tracing::error!("Inference error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Classifier failed to score the input")
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Outcome store unavailable")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ScoreError> for AppError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::Validation(e) => AppError::Validation(e.to_string()),
            ScoreError::Inference(e) => AppError::Inference(e.to_string()),
            ScoreError::Persistence(e) => AppError::Persistence(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmptyWindow | StoreError::WindowTooLarge { .. } => {
                AppError::BadRequest(err.to_string())
            }
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) => AppError::Validation(rejection.body_text()),
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
