//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::inference::{InferenceError, ValidationError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Client errors
    Validation(ValidationError),
    InvalidRequest(String),
    NotFound,

    // Model errors
    InferenceFailed(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InferenceFailed(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(err) => err.code(),
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::NotFound => "not_found",
            AppError::InferenceFailed(_) => "inference_failed",
            AppError::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            AppError::Validation(err) => {
                tracing::warn!("Rejected request: {}", err);
                err.to_string()
            }
            AppError::InvalidRequest(msg) => {
                tracing::warn!("Invalid request: {}", msg);
                msg
            }
            AppError::NotFound => "Endpoint not found".to_string(),
            AppError::InferenceFailed(msg) => msg,
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "status": "error",
            "error_code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Validation(err) => AppError::Validation(err),
            InferenceError::Model(err) => {
                tracing::error!(error = ?err, "Inference failed: {}", err);
                AppError::InferenceFailed(err.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("inference worker failed: {}", err))
    }
}
