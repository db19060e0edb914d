use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trustbot_core::TrustbotError;
use trustbot_storage::StorageError;

use super::{api_error, status_for, ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub receipt: String,
    pub purged: bool,
}

fn storage_error(e: StorageError) -> ApiError {
    let e = TrustbotError::from(e);
    (status_for(&e), Json(ErrorResponse::from(e)))
}

/// GET /v1/evidence/{receipt}
pub async fn evidence_get(
    State(state): State<Arc<AppState>>,
    Path(receipt): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.evidence.get(&receipt).map_err(storage_error)? {
        Some(payload) => Ok(Json(payload)),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("no pending evidence request for {}", receipt),
            "not_found",
        )),
    }
}

/// DELETE /v1/evidence/{receipt}
pub async fn evidence_purge(
    State(state): State<Arc<AppState>>,
    Path(receipt): Path<String>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let purged = state.evidence.purge(&receipt).map_err(storage_error)?;
    Ok(Json(PurgeResponse { receipt, purged }))
}
