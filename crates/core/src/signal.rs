//! Signals, reason codes and the per-pipeline result contract.
//!
//! Every analyzer returns one [`PipelineResult`]. The dispatcher concatenates
//! them; nothing downstream mutates a result once it is produced.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named heuristic risk estimate in [0, 1] (0 = benign, 1 = malicious).
///
/// The name is descriptive only; fusion never looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub score: f64,
}

impl Signal {
    /// Build a signal, clamping the score into [0, 1].
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        let score = if score.is_nan() { 0.5 } else { score.clamp(0.0, 1.0) };
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Closed set of tags explaining why a signal fired or why evidence is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    // Text / scam
    ScamUrgentLanguage,
    ScamOtpRequest,
    ScamPaymentReversal,
    ScamKycThreat,
    ScamPhoneCallback,
    // URL / provenance
    UrlShortener,
    UrlIpLiteral,
    UrlSuspiciousTld,
    UrlNoTls,
    UrlPunycode,
    UrlRedirectChain,
    UrlDownloadable,
    UrlFormLure,
    UrlLoginKeywords,
    UrlFetchFailed,
    // Media
    ImgHeavyCompression,
    ImgTextlikeEdges,
    ImgLowSignal,
    ImgDecodeFailed,
    // Document / OCR
    DocOcrUnavailable,
    DocTextExtracted,
    // Input
    InputMissing,
    // Evidence
    NeedResendAsDocument,
    NeedSourceUrl,
    NeedMoreContext,
}

impl ReasonCode {
    /// Every code, in declaration order.
    pub const ALL: [ReasonCode; 25] = [
        ReasonCode::ScamUrgentLanguage,
        ReasonCode::ScamOtpRequest,
        ReasonCode::ScamPaymentReversal,
        ReasonCode::ScamKycThreat,
        ReasonCode::ScamPhoneCallback,
        ReasonCode::UrlShortener,
        ReasonCode::UrlIpLiteral,
        ReasonCode::UrlSuspiciousTld,
        ReasonCode::UrlNoTls,
        ReasonCode::UrlPunycode,
        ReasonCode::UrlRedirectChain,
        ReasonCode::UrlDownloadable,
        ReasonCode::UrlFormLure,
        ReasonCode::UrlLoginKeywords,
        ReasonCode::UrlFetchFailed,
        ReasonCode::ImgHeavyCompression,
        ReasonCode::ImgTextlikeEdges,
        ReasonCode::ImgLowSignal,
        ReasonCode::ImgDecodeFailed,
        ReasonCode::DocOcrUnavailable,
        ReasonCode::DocTextExtracted,
        ReasonCode::InputMissing,
        ReasonCode::NeedResendAsDocument,
        ReasonCode::NeedSourceUrl,
        ReasonCode::NeedMoreContext,
    ];

    /// Same string as the serde wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::ScamUrgentLanguage => "SCAM_URGENT_LANGUAGE",
            ReasonCode::ScamOtpRequest => "SCAM_OTP_REQUEST",
            ReasonCode::ScamPaymentReversal => "SCAM_PAYMENT_REVERSAL",
            ReasonCode::ScamKycThreat => "SCAM_KYC_THREAT",
            ReasonCode::ScamPhoneCallback => "SCAM_PHONE_CALLBACK",
            ReasonCode::UrlShortener => "URL_SHORTENER",
            ReasonCode::UrlIpLiteral => "URL_IP_LITERAL",
            ReasonCode::UrlSuspiciousTld => "URL_SUSPICIOUS_TLD",
            ReasonCode::UrlNoTls => "URL_NO_TLS",
            ReasonCode::UrlPunycode => "URL_PUNYCODE",
            ReasonCode::UrlRedirectChain => "URL_REDIRECT_CHAIN",
            ReasonCode::UrlDownloadable => "URL_DOWNLOADABLE",
            ReasonCode::UrlFormLure => "URL_FORM_LURE",
            ReasonCode::UrlLoginKeywords => "URL_LOGIN_KEYWORDS",
            ReasonCode::UrlFetchFailed => "URL_FETCH_FAILED",
            ReasonCode::ImgHeavyCompression => "IMG_HEAVY_COMPRESSION",
            ReasonCode::ImgTextlikeEdges => "IMG_TEXTLIKE_EDGES",
            ReasonCode::ImgLowSignal => "IMG_LOW_SIGNAL",
            ReasonCode::ImgDecodeFailed => "IMG_DECODE_FAILED",
            ReasonCode::DocOcrUnavailable => "DOC_OCR_UNAVAILABLE",
            ReasonCode::DocTextExtracted => "DOC_TEXT_EXTRACTED",
            ReasonCode::InputMissing => "INPUT_MISSING",
            ReasonCode::NeedResendAsDocument => "NEED_RESEND_AS_DOCUMENT",
            ReasonCode::NeedSourceUrl => "NEED_SOURCE_URL",
            ReasonCode::NeedMoreContext => "NEED_MORE_CONTEXT",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order-preserving deduplication of reason codes.
pub fn dedup_codes(codes: &[ReasonCode]) -> Vec<ReasonCode> {
    let mut out: Vec<ReasonCode> = Vec::with_capacity(codes.len());
    for code in codes {
        if !out.contains(code) {
            out.push(*code);
        }
    }
    out
}

/// The unit contract every analyzer pipeline returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub signals: Vec<Signal>,
    pub reasons: Vec<String>,
    pub reason_codes: Vec<ReasonCode>,
    /// 0 = no degradation, 1 = evidence is essentially unusable.
    pub quality_penalty: f64,
    /// Opaque observability record. Always carries `"name"`.
    pub debug: Map<String, Value>,
}

impl PipelineResult {
    /// Empty result tagged with the producing pipeline's name.
    pub fn new(pipeline: &str) -> Self {
        let mut debug = Map::new();
        debug.insert("name".into(), Value::String(pipeline.to_string()));
        Self {
            signals: Vec::new(),
            reasons: Vec::new(),
            reason_codes: Vec::new(),
            quality_penalty: 0.0,
            debug,
        }
    }

    /// Neutral-risk result for evidence the pipeline could not use.
    pub fn degraded(
        pipeline: &str,
        signal: &str,
        reason: impl Into<String>,
        code: ReasonCode,
        penalty: f64,
    ) -> Self {
        let mut out = Self::new(pipeline);
        out.flag(signal, 0.5, reason, code);
        out.raise_penalty(penalty);
        out
    }

    /// Result for a required input that was absent or empty.
    pub fn missing(pipeline: &str, what: &str) -> Self {
        let mut out = Self::degraded(
            pipeline,
            &format!("missing_{}", what),
            format!("No {} provided.", what),
            ReasonCode::InputMissing,
            1.0,
        );
        out.note("error", "missing");
        out
    }

    /// Record a fired heuristic: signal, reason and code together.
    pub fn flag(&mut self, signal: &str, score: f64, reason: impl Into<String>, code: ReasonCode) {
        self.signals.push(Signal::new(signal, score));
        self.reasons.push(reason.into());
        self.reason_codes.push(code);
    }

    pub fn push_signal(&mut self, signal: &str, score: f64) {
        self.signals.push(Signal::new(signal, score));
    }

    /// Raise the penalty to at least `penalty` (never lowers it).
    pub fn raise_penalty(&mut self, penalty: f64) {
        let p = if penalty.is_nan() { 1.0 } else { penalty.clamp(0.0, 1.0) };
        if p > self.quality_penalty {
            self.quality_penalty = p;
        }
    }

    pub fn note(&mut self, key: &str, value: impl Into<Value>) {
        self.debug.insert(key.to_string(), value.into());
    }

    /// Pipeline name from the debug record.
    pub fn name(&self) -> &str {
        self.debug.get("name").and_then(Value::as_str).unwrap_or("unknown")
    }
}
