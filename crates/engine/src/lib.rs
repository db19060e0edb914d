//! Decision engine: dispatch, fusion, evidence escalation and response
//! assembly under a single per-request deadline.

pub mod dispatch;
pub mod escalation;
pub mod fusion;
pub mod response;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, Instrument};
use trustbot_analyzers::{DocumentAnalyzer, PageFetcher, ProvenanceAnalyzer, ReqwestFetcher};
use trustbot_core::{AnalyzeRequest, AnalyzeResponse, Config, TrustbotError};

pub use dispatch::{Dispatched, Dispatcher};
pub use escalation::EscalationPolicy;
pub use fusion::{fuse, FusionEngine};

pub struct TrustEngine {
    dispatcher: Dispatcher,
    fusion: FusionEngine,
    escalation: EscalationPolicy,
    deadline: Duration,
}

impl TrustEngine {
    /// Production wiring: reqwest fetcher and a probed OCR capability.
    pub fn from_config(config: &Config) -> Result<Self, TrustbotError> {
        let fetcher = ReqwestFetcher::new(&config.analyzers)
            .map_err(|e| TrustbotError::Other(format!("http client: {}", e)))?;
        let document = DocumentAnalyzer::new(&config.analyzers);
        Ok(Self::new(config, Arc::new(fetcher), document))
    }

    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>, document: DocumentAnalyzer) -> Self {
        Self {
            dispatcher: Dispatcher::new(&config.analyzers, ProvenanceAnalyzer::new(fetcher), document),
            fusion: FusionEngine::new(config.fusion),
            escalation: EscalationPolicy::new(config.escalation),
            deadline: Duration::from_secs(config.engine.request_deadline_secs),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn ocr_available(&self) -> bool {
        self.dispatcher.document().ocr_capability().is_available()
    }

    /// Classify one piece of content. The only error is an expired deadline,
    /// in which case outstanding pipeline work is dropped.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, TrustbotError> {
        let span = info_span!("analyze", content_type = %request.content_type);
        async {
            let dispatched = tokio::time::timeout(self.deadline, self.dispatcher.dispatch(request))
                .await
                .map_err(|_| TrustbotError::DeadlineExceeded {
                    millis: self.deadline.as_millis() as u64,
                })?;

            let fused = self.fusion.fuse(&dispatched.signals, dispatched.quality_penalty);
            let evidence = self.escalation.maybe_request_evidence(
                fused.verdict,
                fused.confidence,
                request.content_type,
                &dispatched.reason_codes,
            );

            info!(
                verdict = %fused.verdict,
                confidence = fused.confidence,
                risk = fused.risk,
                signals = dispatched.signals.len(),
                evidence_requested = evidence.is_some(),
                "Analysis complete"
            );

            Ok(response::assemble(fused, dispatched, evidence))
        }
        .instrument(span)
        .await
    }
}
