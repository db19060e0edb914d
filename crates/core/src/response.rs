use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::signal::ReasonCode;
use crate::verdict::{EvidenceRequest, Verdict};

/// Maximum reason strings surfaced to the user.
pub const MAX_REASONS: usize = 8;

/// Maximum reason codes surfaced to the user (after dedup).
pub const MAX_REASON_CODES: usize = 12;

/// Observability payload attached to every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDebug {
    pub risk: f64,
    pub pipelines: Vec<Map<String, Value>>,
    /// Extra keys added by outer layers (e.g. a media receipt).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Caller-facing analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub reason_codes: Vec<ReasonCode>,
    pub next_step: String,
    pub evidence_request: Option<EvidenceRequest>,
    pub debug: ResponseDebug,
}
