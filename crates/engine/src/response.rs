use serde_json::{Map, Value};
use trustbot_core::{
    dedup_codes, AnalyzeResponse, EvidenceRequest, FusionResult, ResponseDebug, Verdict, MAX_REASONS,
    MAX_REASON_CODES,
};

use crate::dispatch::Dispatched;

pub fn next_step(verdict: Verdict, evidence_requested: bool) -> &'static str {
    if evidence_requested {
        return "Need 1 more input to be confident.";
    }
    match verdict {
        Verdict::Risky => {
            "Do not act on this. Avoid clicking links or sharing OTP. Verify via official channels."
        }
        Verdict::Safe => {
            "Looks safe based on available signals, but stay cautious and verify source if high-stakes."
        }
        Verdict::Unsure => "Uncertain. Verify source and ask for the original file/link.",
    }
}

/// Build the caller-facing response. Reasons keep emission order; codes are
/// deduplicated before truncation.
pub fn assemble(
    fusion: FusionResult,
    dispatched: Dispatched,
    evidence_request: Option<EvidenceRequest>,
) -> AnalyzeResponse {
    let mut reasons = dispatched.reasons;
    reasons.truncate(MAX_REASONS);

    let mut reason_codes = dedup_codes(&dispatched.reason_codes);
    reason_codes.truncate(MAX_REASON_CODES);

    AnalyzeResponse {
        verdict: fusion.verdict,
        confidence: fusion.confidence,
        reasons,
        reason_codes,
        next_step: next_step(fusion.verdict, evidence_request.is_some()).to_string(),
        evidence_request,
        debug: ResponseDebug {
            risk: fusion.risk,
            pipelines: dispatched.pipelines,
            extra: Map::<String, Value>::new(),
        },
    }
}
