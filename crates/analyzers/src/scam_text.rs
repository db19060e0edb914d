//! Keyword heuristics for social-engineering text.
//!
//! Each detector fires at most once and contributes a fixed score. The scan
//! also reports the URLs it finds so the dispatcher can follow them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use trustbot_core::{PipelineResult, ReasonCode};

pub const PIPELINE: &str = "scam_text";

pub const URGENT_SCORE: f64 = 0.65;
pub const OTP_SCORE: f64 = 0.9;
pub const KYC_SCORE: f64 = 0.8;
pub const UPI_SCORE: f64 = 0.75;
pub const CALLBACK_SCORE: f64 = 0.7;
pub const NO_INDICATOR_SCORE: f64 = 0.45;

const URGENT_WORDS: &[&str] = &[
    "urgent",
    "immediately",
    "act now",
    "last chance",
    "final warning",
    "blocked",
    "suspended",
    "freeze",
];

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("valid URL regex"));
static RE_CALL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bcall\b|\bphone\b|\bhelpline\b").expect("valid callback regex"));
static RE_PHONE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\-\s]{7,}").expect("valid phone regex"));

/// Output of the text scan: the pipeline result plus the URLs it saw.
#[derive(Debug, Clone)]
pub struct TextScan {
    pub result: PipelineResult,
    pub urls: Vec<String>,
}

/// Pull `http(s)://` URLs out of free text, trimming trailing punctuation.
pub fn extract_urls(text: &str) -> Vec<String> {
    RE_URL
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"', '>'])
                .to_string()
        })
        .filter(|u| !u.is_empty())
        .collect()
}

fn any_of(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Run the scam heuristics over `text`.
pub fn analyze_text(text: &str) -> TextScan {
    let t = text.trim();
    if t.is_empty() {
        return TextScan {
            result: PipelineResult::missing(PIPELINE, "text"),
            urls: Vec::new(),
        };
    }

    let tl = t.to_lowercase();
    let mut out = PipelineResult::new(PIPELINE);

    if any_of(&tl, URGENT_WORDS) {
        out.flag(
            "urgent_language",
            URGENT_SCORE,
            "Uses urgent or threatening language designed to rush you.",
            ReasonCode::ScamUrgentLanguage,
        );
    }

    if tl.contains("otp") || tl.contains("one time password") {
        out.flag(
            "otp_request",
            OTP_SCORE,
            "Asks for an OTP, a common scam pattern.",
            ReasonCode::ScamOtpRequest,
        );
    }

    if tl.contains("kyc") && any_of(&tl, &["block", "suspend", "freeze"]) {
        out.flag(
            "kyc_threat",
            KYC_SCORE,
            "Threatens account action tied to KYC, a common social-engineering tactic.",
            ReasonCode::ScamKycThreat,
        );
    }

    if tl.contains("upi") && any_of(&tl, &["reversal", "chargeback", "refund", "collect"]) {
        out.flag(
            "upi_reversal",
            UPI_SCORE,
            "Mentions a UPI reversal, refund or collect request, often used to trick users into approving a payment.",
            ReasonCode::ScamPaymentReversal,
        );
    }

    if RE_CALL_WORD.is_match(&tl) && RE_PHONE_RUN.is_match(&tl) {
        out.flag(
            "phone_callback",
            CALLBACK_SCORE,
            "Asks you to call a number to move the conversation off-platform.",
            ReasonCode::ScamPhoneCallback,
        );
    }

    if out.signals.is_empty() {
        out.push_signal("no_strong_text_indicators", NO_INDICATOR_SCORE);
    }

    let urls = extract_urls(t);
    out.note("len", t.chars().count());
    out.note(
        "urls",
        Value::Array(urls.iter().cloned().map(Value::String).collect()),
    );

    TextScan { result: out, urls }
}
