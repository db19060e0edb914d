//! Route a request to its analyzer pipelines and concatenate their results.
//!
//! Text is dispatched in two phases: the text scan first, then URL lexical
//! and provenance checks for each URL the scan found. URLs are never pulled
//! from fetched pages, so recursion stops at depth one.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use trustbot_analyzers::{image_forensics, scam_text, url_checks, DocumentAnalyzer, ProvenanceAnalyzer};
use trustbot_core::config::AnalyzerConfig;
use trustbot_core::{AnalyzeRequest, ContentType, PipelineResult, ReasonCode, Signal};

pub const UNSUPPORTED_REASON: &str = "Unsupported content type.";

/// Everything the pipelines produced for one request, in invocation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatched {
    pub signals: Vec<Signal>,
    pub reasons: Vec<String>,
    pub reason_codes: Vec<ReasonCode>,
    /// Max over invoked pipelines.
    pub quality_penalty: f64,
    pub pipelines: Vec<Map<String, Value>>,
}

impl Dispatched {
    pub fn absorb(&mut self, result: PipelineResult) {
        self.signals.extend(result.signals);
        self.reasons.extend(result.reasons);
        self.reason_codes.extend(result.reason_codes);
        self.quality_penalty = self.quality_penalty.max(result.quality_penalty);
        self.pipelines.push(result.debug);
    }
}

/// Keep the first `limit` distinct URLs, in order of appearance.
pub fn distinct_urls(urls: Vec<String>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for url in urls {
        if out.len() >= limit {
            break;
        }
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

pub struct Dispatcher {
    provenance: ProvenanceAnalyzer,
    document: Arc<DocumentAnalyzer>,
    url_fanout: usize,
    max_embedded_urls: usize,
}

impl Dispatcher {
    pub fn new(config: &AnalyzerConfig, provenance: ProvenanceAnalyzer, document: DocumentAnalyzer) -> Self {
        Self {
            provenance,
            document: Arc::new(document),
            url_fanout: config.url_fanout.max(1),
            max_embedded_urls: config.max_embedded_urls,
        }
    }

    pub fn document(&self) -> &DocumentAnalyzer {
        &self.document
    }

    /// Never fails: every analyzer problem is already a degraded result.
    pub async fn dispatch(&self, request: &AnalyzeRequest) -> Dispatched {
        let mut out = Dispatched::default();

        match request.content_type {
            ContentType::Text => {
                let scan = scam_text::analyze_text(request.text.as_deref().unwrap_or_default());
                out.absorb(scan.result);

                let urls = distinct_urls(scan.urls, self.max_embedded_urls);
                debug!("Following {} embedded URLs", urls.len());
                for result in self.check_urls(urls).await {
                    out.absorb(result);
                }
            }
            ContentType::Link => {
                let url = request.url.as_deref().unwrap_or_default();
                out.absorb(url_checks::analyze_url(url));
                out.absorb(self.provenance.analyze(url).await);
            }
            ContentType::Image => {
                let bytes = request.image_bytes.clone();
                let result = run_blocking(
                    image_forensics::PIPELINE,
                    ReasonCode::ImgDecodeFailed,
                    move || image_forensics::analyze_image(bytes.as_deref()),
                )
                .await;
                out.absorb(result);
            }
            ContentType::Document => {
                let document = Arc::clone(&self.document);
                let bytes = request.file_bytes.clone();
                let mime = request.file_mime.clone();
                let name = request.file_name.clone();
                let result = run_blocking(
                    trustbot_analyzers::document::PIPELINE,
                    ReasonCode::DocOcrUnavailable,
                    move || document.analyze(bytes.as_deref(), mime.as_deref(), name.as_deref()),
                )
                .await;
                out.absorb(result);
            }
            ContentType::Unsupported => {
                out.reasons.push(UNSUPPORTED_REASON.to_string());
            }
        }

        out
    }

    /// URL lexical then provenance for each URL. Bounded concurrency, results
    /// returned in URL order.
    async fn check_urls(&self, urls: Vec<String>) -> Vec<PipelineResult> {
        let per_url: Vec<[PipelineResult; 2]> = stream::iter(urls)
            .map(|url| async move {
                let lexical = url_checks::analyze_url(&url);
                let provenance = self.provenance.analyze(&url).await;
                [lexical, provenance]
            })
            .buffered(self.url_fanout)
            .collect()
            .await;
        per_url.into_iter().flatten().collect()
    }
}

/// Run a blocking analyzer on the blocking pool. A panic becomes a degraded
/// result instead of failing the request.
async fn run_blocking<F>(pipeline: &'static str, code: ReasonCode, f: F) -> PipelineResult
where
    F: FnOnce() -> PipelineResult + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            warn!("{} task failed: {}", pipeline, e);
            let mut out = PipelineResult::degraded(
                pipeline,
                "analysis_failed",
                "Analysis of this input failed unexpectedly.",
                code,
                1.0,
            );
            out.note("error", e.to_string());
            out
        }
    }
}
