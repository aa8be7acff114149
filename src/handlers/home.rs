use axum::{extract::State, Json};

use crate::models::HomeResponse;
use crate::AppState;

pub const ENDPOINTS: [&str; 6] = [
    "GET /",
    "GET /health",
    "POST /predict",
    "POST /predict/batch",
    "POST /predict/batch/csv",
    "POST /report",
];

pub async fn index(State(state): State<AppState>) -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Heart Disease Prediction API is running",
        available_endpoints: ENDPOINTS.to_vec(),
        required_features: state.service.contract().names().to_vec(),
        risk_policy: state.service.default_policy().name(),
    })
}
