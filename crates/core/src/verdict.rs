use serde::{Deserialize, Serialize};

use crate::signal::ReasonCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Safe,
    Risky,
    Unsure,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Safe => write!(f, "SAFE"),
            Verdict::Risky => write!(f, "RISKY"),
            Verdict::Unsure => write!(f, "UNSURE"),
        }
    }
}

/// Output of signal fusion. Derived per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub risk: f64,
    pub confidence: f64,
    pub verdict: Verdict,
}

/// Artifact the sender is asked to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedArtifact {
    ResendAsDocument,
    SourceUrlOrContext,
    Context,
}

/// A request for one more piece of corroborating evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRequest {
    pub ask: String,
    pub reason_codes: Vec<ReasonCode>,
    pub expected_artifact: Option<ExpectedArtifact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_wire_format() {
        assert_eq!(serde_json::to_string(&Verdict::Risky).unwrap(), "\"RISKY\"");
        let v: Verdict = serde_json::from_str("\"UNSURE\"").unwrap();
        assert_eq!(v, Verdict::Unsure);
        assert_eq!(Verdict::Safe.to_string(), "SAFE");
    }

    #[test]
    fn expected_artifact_wire_format() {
        let req = EvidenceRequest {
            ask: "resend".into(),
            reason_codes: vec![ReasonCode::NeedResendAsDocument],
            expected_artifact: Some(ExpectedArtifact::ResendAsDocument),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["expected_artifact"], "resend_as_document");
        assert_eq!(json["reason_codes"][0], "NEED_RESEND_AS_DOCUMENT");
    }
}
