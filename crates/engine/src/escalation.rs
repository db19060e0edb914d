use trustbot_core::config::EscalationConfig;
use trustbot_core::{dedup_codes, ContentType, EvidenceRequest, ExpectedArtifact, ReasonCode, Verdict};

const ASK_RESEND_MEDIA: &str = "I'm not fully confident due to compression/low signal. Please resend the media as a *Document* (not as a photo), or share the original file if available.";
const ASK_SOURCE: &str = "I'm not fully confident. Can you share the original source link (or where this came from) and 1-2 lines of surrounding context?";
const ASK_CONTEXT: &str =
    "I'm not fully confident. Please share a bit more context or the original source.";

const RESEND_CODES: &[ReasonCode] = &[ReasonCode::NeedResendAsDocument];
const SOURCE_CODES: &[ReasonCode] = &[ReasonCode::NeedSourceUrl, ReasonCode::NeedMoreContext];
const CONTEXT_CODES: &[ReasonCode] = &[ReasonCode::NeedMoreContext];

/// Decides whether one more piece of evidence is worth asking for.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalationPolicy {
    config: EscalationConfig,
}

impl EscalationPolicy {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    /// `None` when the answer stands on its own: confidence at or above the
    /// cut-off and a definite verdict.
    pub fn maybe_request_evidence(
        &self,
        verdict: Verdict,
        confidence: f64,
        content_type: ContentType,
        reason_codes: &[ReasonCode],
    ) -> Option<EvidenceRequest> {
        if confidence >= self.config.answer_at && verdict != Verdict::Unsure {
            return None;
        }

        let (ask, extra, artifact) = match content_type {
            ContentType::Image | ContentType::Document => {
                (ASK_RESEND_MEDIA, RESEND_CODES, ExpectedArtifact::ResendAsDocument)
            }
            ContentType::Text | ContentType::Link => {
                (ASK_SOURCE, SOURCE_CODES, ExpectedArtifact::SourceUrlOrContext)
            }
            ContentType::Unsupported => (ASK_CONTEXT, CONTEXT_CODES, ExpectedArtifact::Context),
        };

        let mut codes = dedup_codes(reason_codes);
        for code in extra {
            if !codes.contains(code) {
                codes.push(*code);
            }
        }

        Some(EvidenceRequest {
            ask: ask.to_string(),
            reason_codes: codes,
            expected_artifact: Some(artifact),
        })
    }
}
