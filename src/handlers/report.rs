//! Patient report handler

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};

use super::json_object;
use crate::error::{AppError, AppResult};
use crate::models::InferenceQuery;
use crate::report::{Report, ReportFormat};
use crate::AppState;

pub async fn render(
    State(state): State<AppState>,
    Query(query): Query<InferenceQuery>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let format = match query.format.as_deref() {
        None => ReportFormat::Html,
        Some(name) => ReportFormat::parse(name).ok_or_else(|| {
            AppError::InvalidRequest(format!("Unknown report format '{}', expected 'html' or 'text'", name))
        })?,
    };
    let policy = state.resolve_policy(query.risk_policy.as_deref())?;
    let input = json_object(&body)?;

    let (vector, result) = state.service.evaluate(&input, &policy)?;
    let report = Report::new(state.service.contract(), &vector, result);
    tracing::info!(report_id = %report.id, risk = %report.result.risk, "Generated report");

    Ok(([(header::CONTENT_TYPE, format.content_type())], report.render(format)))
}
