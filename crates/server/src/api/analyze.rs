use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use trustbot_core::{AnalyzeRequest, AnalyzeResponse, ContentType};
use trustbot_storage::receipt_for_bytes;

use super::{status_for, ApiError, ErrorResponse};
use crate::state::AppState;

/// Wire body for `POST /v1/analyze`. Media travels base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeBody {
    pub content_type: ContentType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_b64: Option<String>,
    #[serde(default)]
    pub file_b64: Option<String>,
    #[serde(default)]
    pub file_mime: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// Undecodable base64 reads as absent media; the pipeline reports it missing.
fn decode_media(field: &str, b64: Option<&str>) -> Option<Vec<u8>> {
    let raw = b64?.trim();
    if raw.is_empty() {
        return None;
    }
    match STANDARD.decode(raw) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Ignoring undecodable {}: {}", field, e);
            None
        }
    }
}

impl AnalyzeBody {
    pub fn into_request(self) -> AnalyzeRequest {
        let mut req = AnalyzeRequest::empty(self.content_type);
        req.image_bytes = decode_media("image_b64", self.image_b64.as_deref());
        req.file_bytes = decode_media("file_b64", self.file_b64.as_deref());
        req.text = self.text;
        req.url = self.url;
        req.file_mime = self.file_mime;
        req.file_name = self.file_name;
        if let Some(locale) = self.locale {
            req.locale = locale;
        }
        req.user_id = self.user_id;
        req.metadata = self.metadata;
        req
    }
}

/// Remember what was asked for a media item, keyed by its content receipt.
fn remember_evidence_request(state: &AppState, request: &AnalyzeRequest, response: &mut AnalyzeResponse) {
    let (Some(ask), Some(bytes)) = (&response.evidence_request, request.media_bytes()) else {
        return;
    };
    let receipt = receipt_for_bytes(bytes);
    let payload = json!({
        "content_type": request.content_type,
        "verdict": response.verdict,
        "confidence": response.confidence,
        "evidence_request": ask,
        "stored_at": Utc::now().to_rfc3339(),
    });
    match state.evidence.put(&receipt, payload, state.evidence_ttl) {
        Ok(()) => {
            response.debug.extra.insert("receipt".to_string(), Value::String(receipt));
        }
        Err(e) => warn!("Could not store evidence context: {}", e),
    }
}

/// POST /v1/analyze
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request = body.into_request();
    info!(
        "Analyze request: content_type={} user={}",
        request.content_type,
        request.user_id.as_deref().unwrap_or("-")
    );

    let mut response = state
        .engine
        .analyze(&request)
        .await
        .map_err(|e| (status_for(&e), Json(ErrorResponse::from(e))))?;

    if request.content_type.is_media() {
        remember_evidence_request(&state, &request, &mut response);
    }

    Ok(Json(response))
}
