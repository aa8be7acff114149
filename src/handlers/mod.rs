//! HTTP handlers

pub mod health;
pub mod home;
pub mod predict;
pub mod report;


use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Decode a request body that must be a single JSON object.
pub(crate) fn json_object(body: &Bytes) -> AppResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::InvalidRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(err) => Err(AppError::InvalidRequest(format!("Invalid JSON body: {}", err))),
    }
}
