use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, header},
    response::Json,
};
use bytes::Bytes;
use mdlog_core::{LogRecord, MdlogError};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// `POST /log` — append the JSON body to `error_log.md`.
pub async fn save_log(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let started = Instant::now();
    match append(&state, &headers, body).await {
        Ok(filename) => {
            state.metrics.record_append(started.elapsed().as_secs_f64());
            info!(filename, "Log saved");
            Ok(Json(json!({
                "message": "Log saved successfully",
                "filename": filename,
            })))
        }
        Err(e) => {
            error!(error = %e, kind = e.kind().as_str(), "Error saving log");
            state.metrics.record_failure(e.kind());
            Err(ApiError(e))
        }
    }
}

async fn append(
    state: &Arc<AppState>,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<&'static str, MdlogError> {
    if !is_json_content_type(headers) {
        return Err(MdlogError::Parse(
            "expected Content-Type: application/json".into(),
        ));
    }
    let body = body.map_err(|e| MdlogError::Parse(e.body_text()))?;
    let record = LogRecord::from_slice(&body)?;

    // File I/O is blocking; keep it off the async workers.
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || state.appender.append(&record))
        .await
        .map_err(|e| MdlogError::Internal(format!("append task failed: {e}")))?
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}
