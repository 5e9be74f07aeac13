//! Calculate endpoint (`POST /calculate`).
//!
//! Decodes the canvas image, runs the analyzer, and normalizes whatever it
//! recovered into a non-empty list of complete records.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use inkcalc_analyzer::Analyzer;
use inkcalc_core::{
    AnalysisRequest, CalcError, ExpressionRecord, PLACEHOLDER_EXPR, PLACEHOLDER_RESULT,
    ParsedRecord, value_to_text,
};
use inkcalc_logging::redact_sensitive_data;
use inkcalc_understanding::decode_image_payload;

use crate::error::ApiError;
use crate::server::AppState;

/// Handler for `POST /calculate`.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<Vec<ExpressionRecord>>, ApiError> {
    let Json(request) = payload?;
    let span = info_span!("calculate", request_id = %Uuid::new_v4());
    let records = process_request(&state.analyzer, &request)
        .instrument(span)
        .await?;
    Ok(Json(records))
}

/// Decode, analyze, and normalize one request.
///
/// Malformed image data is reported as [`CalcError::InvalidInput`] before any
/// model call; every other failure becomes [`CalcError::Processing`].
pub async fn process_request(
    analyzer: &Analyzer,
    request: &AnalysisRequest,
) -> Result<Vec<ExpressionRecord>, CalcError> {
    info!(
        payload_chars = request.data.len(),
        variables = request.dict_of_vars.len(),
        "Received calculate request"
    );

    let image = decode_image_payload(&request.data).map_err(|e| match e {
        CalcError::InvalidInput(msg) => CalcError::InvalidInput(msg),
        CalcError::Processing(msg) => processing_error(msg),
        other => processing_error(other),
    })?;

    let parsed = analyzer
        .analyze(&image, &request.dict_of_vars)
        .await
        .map_err(|e| processing_error(format!("{:#}", e)))?;

    let records = normalize_records(parsed);
    info!(records = records.len(), "Calculate request complete");
    Ok(records)
}

fn processing_error(cause: impl ToString) -> CalcError {
    let message = redact_sensitive_data(&cause.to_string());
    error!(error = %message, "Error processing image");
    CalcError::Processing(message)
}

/// Turn analyzer output into caller-facing records.
///
/// An empty input yields the single placeholder record; missing fields are
/// backfilled with the placeholder values and non-text values are rendered
/// as text. Applying this to its own output changes nothing.
pub fn normalize_records(parsed: Vec<ParsedRecord>) -> Vec<ExpressionRecord> {
    if parsed.is_empty() {
        return vec![ExpressionRecord::placeholder()];
    }
    parsed
        .into_iter()
        .map(|record| ExpressionRecord {
            expr: record
                .expr
                .as_ref()
                .and_then(value_to_text)
                .unwrap_or_else(|| PLACEHOLDER_EXPR.to_string()),
            result: record
                .result
                .as_ref()
                .and_then(value_to_text)
                .unwrap_or_else(|| PLACEHOLDER_RESULT.to_string()),
            assign: record.assign,
        })
        .collect()
}
