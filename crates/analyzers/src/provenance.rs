//! Provenance checks: fetch the link and inspect where it actually leads.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use serde_json::json;
use tracing::{debug, warn};
use trustbot_core::config::AnalyzerConfig;
use trustbot_core::{PipelineResult, ReasonCode};
use url::Url;

use crate::error::AnalyzerError;
use crate::url_checks::has_login_hint;

pub const PIPELINE: &str = "provenance";

/// Penalty applied when the page could not be fetched at all.
pub const FETCH_FAILED_PENALTY: f64 = 0.3;

const DOWNLOAD_TYPES: &[&str] = &[
    "application/octet-stream",
    "application/zip",
    "application/x-msdownload",
];

const FORM_HINTS: &[&str] = &[
    "<form",
    "type=\"password\"",
    "name=\"password\"",
    "enter otp",
    "submit",
];

/// What a fetch observed. The body is capped; `truncated` marks a cut.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub final_url: String,
    pub status: u16,
    /// Every URL visited, starting with the requested one.
    pub chain: Vec<String>,
    pub content_type: String,
    pub body: Vec<u8>,
    pub truncated: bool,
}

/// Fetches a page for provenance inspection. Implementations must bound
/// time, body size and redirect hops.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AnalyzerError>;
}

/// `reqwest`-backed fetcher that follows redirects by hand so the full
/// chain is recorded.
pub struct ReqwestFetcher {
    client: reqwest::Client,
    /// Bounds the whole fetch: every redirect hop plus the body read.
    timeout: Duration,
    max_bytes: usize,
    max_redirects: usize,
}

impl ReqwestFetcher {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let timeout = Duration::from_secs(config.provenance_timeout_secs);
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(config.provenance_user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            timeout,
            max_bytes: config.provenance_max_bytes,
            max_redirects: config.provenance_max_redirects,
        })
    }

    async fn fetch_unbounded(&self, url: &str) -> Result<FetchedPage, AnalyzerError> {
        let mut current = Url::parse(url)?;
        let mut chain = vec![current.to_string()];

        let mut response = loop {
            debug!("Provenance fetch {}", current);
            let response = self.client.get(current.clone()).send().await?;
            if !response.status().is_redirection() {
                break response;
            }
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
            else {
                break response;
            };
            if chain.len() > self.max_redirects {
                return Err(AnalyzerError::Fetch(format!(
                    "more than {} redirects",
                    self.max_redirects
                )));
            }
            current = current.join(&location)?;
            chain.push(current.to_string());
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        let mut body = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await? {
            let room = self.max_bytes.saturating_sub(body.len());
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            final_url: current.to_string(),
            status,
            chain,
            content_type,
            body,
            truncated,
        })
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AnalyzerError> {
        tokio::time::timeout(self.timeout, self.fetch_unbounded(url))
            .await
            .map_err(|_| {
                AnalyzerError::Fetch(format!("timed out after {}ms", self.timeout.as_millis()))
            })?
    }
}

/// Case-insensitive substring search over raw bytes.
fn body_contains_any(body: &[u8], needles: &[&str]) -> bool {
    let lower = body.to_ascii_lowercase();
    needles.iter().any(|n| {
        let n = n.as_bytes();
        lower.windows(n.len()).any(|w| w == n)
    })
}

fn normalized(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

/// Score a fetched page.
pub fn inspect_page(requested: &str, page: &FetchedPage) -> PipelineResult {
    let mut out = PipelineResult::new(PIPELINE);

    if page.chain.len() >= 3 {
        out.flag(
            "redirect_chain",
            0.6,
            format!(
                "Link redirects multiple times ({} redirects), which is common in phishing flows.",
                page.chain.len() - 1
            ),
            ReasonCode::UrlRedirectChain,
        );
    }

    if DOWNLOAD_TYPES.iter().any(|t| page.content_type.contains(t)) {
        out.flag(
            "downloadable",
            0.7,
            "Destination looks like a direct download; be cautious with files from unknown sources.",
            ReasonCode::UrlDownloadable,
        );
    }

    if body_contains_any(&page.body, FORM_HINTS) {
        out.flag(
            "form_lure",
            0.7,
            "Page contains form or password patterns typical of credential capture pages.",
            ReasonCode::UrlFormLure,
        );
    }

    // The requested URL was already scored lexically; only a new destination counts.
    if normalized(&page.final_url) != normalized(requested) && has_login_hint(&page.final_url) {
        out.flag(
            "login_keywords",
            0.6,
            "Link lands on a URL with login or verification keywords often used in phishing.",
            ReasonCode::UrlLoginKeywords,
        );
    }

    if out.signals.is_empty() {
        out.push_signal("no_strong_provenance_indicators", 0.45);
    }

    out.note(
        "fetch",
        json!({
            "ok": true,
            "final_url": page.final_url,
            "status": page.status,
            "chain": page.chain,
            "content_type": page.content_type,
            "bytes": page.body.len(),
            "truncated": page.truncated,
        }),
    );
    out
}

/// Provenance pipeline over a pluggable fetcher.
#[derive(Clone)]
pub struct ProvenanceAnalyzer {
    fetcher: Arc<dyn PageFetcher>,
}

impl ProvenanceAnalyzer {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn analyze(&self, url: &str) -> PipelineResult {
        let u = url.trim();
        if u.is_empty() {
            return PipelineResult::missing(PIPELINE, "url");
        }

        match self.fetcher.fetch(u).await {
            Ok(page) => inspect_page(u, &page),
            Err(e) => {
                warn!("Provenance fetch failed for {}: {}", u, e);
                let mut out = PipelineResult::degraded(
                    PIPELINE,
                    "fetch_failed",
                    "Could not fetch the link for provenance checks (network blocked or site unreachable).",
                    ReasonCode::UrlFetchFailed,
                    FETCH_FAILED_PENALTY,
                );
                out.note("fetch", json!({ "ok": false, "error": e.to_string() }));
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned fetcher: returns the page or fails, never touches the network.
    pub struct StubFetcher(pub Option<FetchedPage>);

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, AnalyzerError> {
            match &self.0 {
                Some(page) => {
                    let mut page = page.clone();
                    if page.chain.is_empty() {
                        page.chain = vec![url.to_string()];
                        page.final_url = url.to_string();
                    }
                    Ok(page)
                }
                None => Err(AnalyzerError::Fetch("connection refused".into())),
            }
        }
    }

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            status: 200,
            content_type: "text/html".into(),
            body: body.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fetch_failure_is_degraded_not_fatal() {
        let analyzer = ProvenanceAnalyzer::new(Arc::new(StubFetcher(None)));
        let r = analyzer.analyze("http://192.168.1.1/login").await;
        assert_eq!(r.signals.len(), 1);
        assert_eq!(r.signals[0].name, "fetch_failed");
        assert_eq!(r.signals[0].score, 0.5);
        assert_eq!(r.reason_codes, vec![ReasonCode::UrlFetchFailed]);
        assert_eq!(r.quality_penalty, FETCH_FAILED_PENALTY);
        assert_eq!(r.debug["fetch"]["ok"], false);
    }

    #[tokio::test]
    async fn password_form_is_a_lure() {
        let analyzer = ProvenanceAnalyzer::new(Arc::new(StubFetcher(Some(page(
            r#"<html><FORM><input type="password"></FORM></html>"#,
        )))));
        let r = analyzer.analyze("http://192.168.1.1/login").await;
        let names: Vec<&str> = r.signals.iter().map(|s| s.name.as_str()).collect();
        // Same URL as requested, so no second login-keyword hit.
        assert_eq!(names, vec!["form_lure"]);
        assert_eq!(r.quality_penalty, 0.0);
    }

    #[tokio::test]
    async fn redirect_chain_to_login_page() {
        let mut p = page("<p>hello</p>");
        p.chain = vec![
            "https://bit.ly/x".into(),
            "https://track.example/r".into(),
            "https://secure-bank.example/verify".into(),
        ];
        p.final_url = "https://secure-bank.example/verify".into();
        let analyzer = ProvenanceAnalyzer::new(Arc::new(StubFetcher(Some(p))));
        let r = analyzer.analyze("https://bit.ly/x").await;
        let names: Vec<&str> = r.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["redirect_chain", "login_keywords"]);
        assert!(r.reasons[0].contains("2 redirects"));
    }

    #[tokio::test]
    async fn download_content_type() {
        let mut p = page("");
        p.content_type = "application/zip".into();
        let r = ProvenanceAnalyzer::new(Arc::new(StubFetcher(Some(p))))
            .analyze("https://files.example/a.zip")
            .await;
        assert_eq!(r.reason_codes, vec![ReasonCode::UrlDownloadable]);
    }

    #[tokio::test]
    async fn plain_page_has_no_indicators() {
        let r = ProvenanceAnalyzer::new(Arc::new(StubFetcher(Some(page("<p>menu</p>")))))
            .analyze("https://cafe.example/")
            .await;
        assert_eq!(r.signals[0].name, "no_strong_provenance_indicators");
        assert_eq!(r.signals[0].score, 0.45);
        assert_eq!(r.debug["fetch"]["truncated"], false);
    }

    #[tokio::test]
    async fn empty_url_is_missing() {
        let r = ProvenanceAnalyzer::new(Arc::new(StubFetcher(None))).analyze(" ").await;
        assert_eq!(r.quality_penalty, 1.0);
        assert_eq!(r.reason_codes, vec![ReasonCode::InputMissing]);
    }
}
