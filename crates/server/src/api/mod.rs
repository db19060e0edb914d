//! Endpoint handlers. Shared error shape lives here.

mod analyze;
mod evidence;
mod health;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use trustbot_core::TrustbotError;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: impl Into<String>, kind: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            kind: kind.to_string(),
        }),
    )
}

impl From<TrustbotError> for ErrorResponse {
    fn from(e: TrustbotError) -> Self {
        Self {
            kind: e.kind().to_string(),
            error: e.to_string(),
        }
    }
}

pub(crate) fn status_for(e: &TrustbotError) -> StatusCode {
    match e {
        TrustbotError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Re-exports ───────────────────────────────────────────────────

pub use analyze::{analyze, AnalyzeBody};
pub use evidence::{evidence_get, evidence_purge, PurgeResponse};
pub use health::{health, healthz, HealthResponse};
