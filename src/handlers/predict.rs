//! Inference handlers
//!
//! Single records are scored inline. Batches and CSV tables go through
//! `spawn_blocking` so a large table does not stall the runtime.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};

use super::json_object;
use crate::error::{AppError, AppResult};
use crate::models::{BatchRequest, BatchResponse, BatchResult, FeatureValue, InferenceQuery, PredictResponse};
use crate::AppState;

/// Columns appended to every row of a scored CSV table.
pub const CSV_RESULT_COLUMNS: [&str; 4] = ["Prediction", "Probability", "Risk Level", "Explanation"];

pub async fn single(
    State(state): State<AppState>,
    Query(query): Query<InferenceQuery>,
    body: Bytes,
) -> AppResult<Json<PredictResponse>> {
    let policy = state.resolve_policy(query.risk_policy.as_deref())?;
    let input = json_object(&body)?;
    tracing::info!(fields = input.len(), "Received prediction request");

    let result = state.service.handle_with(&input, &policy)?;
    tracing::info!(
        prediction = result.label,
        probability = result.probability,
        risk = %result.risk,
        "Prediction complete"
    );

    Ok(Json(PredictResponse::success(input, result)))
}

pub async fn batch(
    State(state): State<AppState>,
    Query(query): Query<InferenceQuery>,
    body: Bytes,
) -> AppResult<Json<BatchResponse>> {
    let policy = state.resolve_policy(query.risk_policy.as_deref())?;
    let request: BatchRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid batch body: {}", e)))?;
    check_batch_size(&state, request.instances.len())?;
    tracing::info!(rows = request.instances.len(), "Received batch request");

    let service = state.service.clone();
    let results = tokio::task::spawn_blocking(move || service.handle_batch(&request.instances, &policy))
        .await??;

    tracing::info!(rows = results.len(), "Batch complete");
    let results: Vec<BatchResult> = results
        .into_iter()
        .enumerate()
        .map(|(row, result)| BatchResult::new(row, result))
        .collect();

    Ok(Json(BatchResponse {
        status: "success",
        count: results.len(),
        results,
    }))
}

pub async fn batch_csv(
    State(state): State<AppState>,
    Query(query): Query<InferenceQuery>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let policy = state.resolve_policy(query.risk_policy.as_deref())?;
    let table = CsvTable::parse(&body)?;
    check_batch_size(&state, table.rows.len())?;
    tracing::info!(rows = table.rows.len(), "Received CSV batch");

    let service = state.service.clone();
    let output = tokio::task::spawn_blocking(move || -> AppResult<Vec<u8>> {
        let records = table.records();
        let results = service.handle_batch(&records, &policy)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = table.headers.clone();
        header.extend(CSV_RESULT_COLUMNS.iter().map(|c| c.to_string()));
        writer.write_record(&header).map_err(csv_write_error)?;

        for (cells, result) in table.rows.iter().zip(&results) {
            let mut line = cells.clone();
            line.push(result.diagnosis().to_string());
            line.push(format!("{:.4}", result.probability));
            line.push(result.risk.to_string());
            line.push(result.explanation());
            writer.write_record(&line).map_err(csv_write_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::InternalError(format!("failed to flush CSV: {}", e)))
    })
    .await??;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"predictions.csv\""),
        ],
        output,
    ))
}

fn check_batch_size(state: &AppState, rows: usize) -> AppResult<()> {
    let max = state.config.max_batch_rows;
    if rows > max {
        return Err(AppError::InvalidRequest(format!(
            "Batch of {} rows exceeds the limit of {}",
            rows, max
        )));
    }
    Ok(())
}

fn csv_write_error(err: csv::Error) -> AppError {
    AppError::InternalError(format!("failed to write CSV: {}", err))
}

/// Uploaded CSV, kept as raw cells so the output echoes the input verbatim.
#[derive(Debug)]
struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    fn parse(body: &[u8]) -> AppResult<Self> {
        let invalid = |e: csv::Error| AppError::InvalidRequest(format!("Invalid CSV: {}", e));

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(body);

        let headers: Vec<String> = reader.headers().map_err(invalid)?.iter().map(String::from).collect();
        if headers.is_empty() {
            return Err(AppError::InvalidRequest("CSV has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(invalid)?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Rows as JSON records; empty cells are left out so they surface as
    /// missing features.
    fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|cells| {
                self.headers
                    .iter()
                    .zip(cells)
                    .filter(|(_, cell)| !cell.is_empty())
                    .map(|(name, cell)| (name.clone(), FeatureValue::parse_cell(cell).to_json()))
                    .collect()
            })
            .collect()
    }
}
