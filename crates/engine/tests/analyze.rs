use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use trustbot_analyzers::{AnalyzerError, Capability, DocumentAnalyzer, FetchedPage, PageFetcher};
use trustbot_core::{
    AnalyzeRequest, Config, ContentType, ExpectedArtifact, ReasonCode, TrustbotError, Verdict,
};
use trustbot_engine::TrustEngine;

const EPS: f64 = 1e-6;

/// Serves `body` for every URL, or fails when `body` is `None`. URLs
/// containing "slow" are answered after a delay.
struct StubFetcher {
    body: Option<&'static str>,
    slow: Duration,
}

impl StubFetcher {
    fn failing() -> Self {
        Self { body: None, slow: Duration::ZERO }
    }

    fn serving(body: &'static str) -> Self {
        Self { body: Some(body), slow: Duration::ZERO }
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AnalyzerError> {
        if url.contains("slow") {
            tokio::time::sleep(self.slow).await;
        }
        let body = self
            .body
            .ok_or_else(|| AnalyzerError::Fetch("network unreachable".into()))?;
        Ok(FetchedPage {
            final_url: url.to_string(),
            status: 200,
            chain: vec![url.to_string()],
            content_type: "text/html".into(),
            body: body.as_bytes().to_vec(),
            truncated: false,
        })
    }
}

fn engine(fetcher: StubFetcher) -> TrustEngine {
    let config = Config::default();
    let document = DocumentAnalyzer::with_capability(
        &config.analyzers,
        Capability::Unavailable("tesseract not installed".into()),
    );
    TrustEngine::new(&config, Arc::new(fetcher), document)
}

fn pipeline_names(resp: &trustbot_core::AnalyzeResponse) -> Vec<String> {
    resp.debug
        .pipelines
        .iter()
        .map(|p| p["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn otp_scam_text_is_confidently_risky() {
    let req = AnalyzeRequest::text(
        "Your account will be suspended immediately, share the OTP to verify KYC",
    );
    let resp = engine(StubFetcher::failing()).analyze(&req).await.unwrap();

    assert_eq!(resp.verdict, Verdict::Risky);
    assert!(resp.debug.risk >= 0.65);
    assert!((resp.confidence - 0.718_333).abs() < EPS);
    assert!(resp.evidence_request.is_none());
    assert_eq!(
        resp.reason_codes,
        vec![
            ReasonCode::ScamUrgentLanguage,
            ReasonCode::ScamOtpRequest,
            ReasonCode::ScamKycThreat
        ]
    );
    assert!(resp.next_step.starts_with("Do not act on this."));
    assert_eq!(pipeline_names(&resp), vec!["scam_text"]);
}

#[tokio::test]
async fn ip_literal_login_link_leans_risky_even_when_unreachable() {
    let req = AnalyzeRequest::link("http://192.168.1.1/login");
    let resp = engine(StubFetcher::failing()).analyze(&req).await.unwrap();

    assert!((resp.debug.risk - 0.625).abs() < EPS);
    assert!(resp.debug.risk > 0.5);
    for code in [
        ReasonCode::UrlIpLiteral,
        ReasonCode::UrlNoTls,
        ReasonCode::UrlLoginKeywords,
        ReasonCode::UrlFetchFailed,
    ] {
        assert!(resp.reason_codes.contains(&code), "missing {}", code);
    }
    // Fetch failure costs confidence, so the engine asks for more.
    let ask = resp.evidence_request.as_ref().expect("evidence request");
    assert_eq!(ask.expected_artifact, Some(ExpectedArtifact::SourceUrlOrContext));
    assert!(ask.reason_codes.contains(&ReasonCode::NeedSourceUrl));
    assert_eq!(pipeline_names(&resp), vec!["url_checks", "provenance"]);
}

#[tokio::test]
async fn credential_form_link_is_risky_with_one_more_ask() {
    let req = AnalyzeRequest::link("http://192.168.1.1/login");
    let resp = engine(StubFetcher::serving(r#"<form><input type="password"></form>"#))
        .analyze(&req)
        .await
        .unwrap();

    assert!((resp.debug.risk - 0.675).abs() < EPS);
    assert!((resp.confidence - 0.5775).abs() < EPS);
    assert_eq!(resp.verdict, Verdict::Risky);
    assert!(resp.reason_codes.contains(&ReasonCode::UrlFormLure));
    assert!(resp.evidence_request.is_some());
    assert_eq!(resp.next_step, "Need 1 more input to be confident.");
}

#[tokio::test]
async fn document_without_ocr_asks_for_resend() {
    let req = AnalyzeRequest::document(b"\x89PNG not really".to_vec(), Some("image/png".into()), None);
    let resp = engine(StubFetcher::failing()).analyze(&req).await.unwrap();

    assert_eq!(resp.verdict, Verdict::Unsure);
    assert_eq!(resp.confidence, 0.0);
    assert_eq!(resp.debug.risk, 0.5);
    let ask = resp.evidence_request.expect("evidence request");
    assert_eq!(ask.expected_artifact, Some(ExpectedArtifact::ResendAsDocument));
    assert_eq!(
        ask.reason_codes,
        vec![ReasonCode::DocOcrUnavailable, ReasonCode::NeedResendAsDocument]
    );
}

#[tokio::test]
async fn image_without_bytes_floors_confidence() {
    let req = AnalyzeRequest::empty(ContentType::Image);
    let resp = engine(StubFetcher::failing()).analyze(&req).await.unwrap();

    assert_eq!(resp.confidence, 0.0);
    assert_eq!(resp.verdict, Verdict::Unsure);
    assert_eq!(resp.reason_codes[0], ReasonCode::InputMissing);
    assert_eq!(
        resp.evidence_request.unwrap().expected_artifact,
        Some(ExpectedArtifact::ResendAsDocument)
    );
}

#[tokio::test]
async fn unsupported_content_is_unsure_with_empty_trace() {
    let req = AnalyzeRequest::empty(ContentType::Unsupported);
    let resp = engine(StubFetcher::failing()).analyze(&req).await.unwrap();

    assert_eq!(resp.reasons, vec!["Unsupported content type."]);
    assert!(resp.debug.pipelines.is_empty());
    assert_eq!(resp.debug.risk, 0.5);
    assert_eq!(resp.verdict, Verdict::Unsure);
    assert_eq!(
        resp.evidence_request.unwrap().expected_artifact,
        Some(ExpectedArtifact::Context)
    );
}

#[tokio::test]
async fn embedded_urls_keep_text_order_under_fanout() {
    let fetcher = StubFetcher {
        body: Some("<p>hi</p>"),
        slow: Duration::from_millis(40),
    };
    let req = AnalyzeRequest::text(
        "see https://slow.example/a then https://fast.example/b and https://slow.example/a again",
    );
    let resp = engine(fetcher).analyze(&req).await.unwrap();

    assert_eq!(
        pipeline_names(&resp),
        vec!["scam_text", "url_checks", "provenance", "url_checks", "provenance"]
    );
    assert_eq!(resp.debug.pipelines[1]["host"], "slow.example");
    assert_eq!(resp.debug.pipelines[3]["host"], "fast.example");
}

#[tokio::test]
async fn expired_deadline_returns_no_verdict() {
    let fetcher = StubFetcher {
        body: Some("<p>hi</p>"),
        slow: Duration::from_secs(5),
    };
    let engine = engine(fetcher).with_deadline(Duration::from_millis(50));
    let err = engine
        .analyze(&AnalyzeRequest::link("https://slow.example/"))
        .await
        .unwrap_err();
    assert!(matches!(err, TrustbotError::DeadlineExceeded { millis: 50 }));
}

#[tokio::test]
async fn malformed_inputs_never_fail_dispatch() {
    let engine = engine(StubFetcher::failing());
    for req in [
        AnalyzeRequest::empty(ContentType::Text),
        AnalyzeRequest::empty(ContentType::Link),
        AnalyzeRequest::empty(ContentType::Document),
        AnalyzeRequest::image(b"garbage".to_vec()),
        AnalyzeRequest::link("::::not a url"),
    ] {
        let resp = engine.analyze(&req).await.unwrap();
        assert!(resp.confidence >= 0.0 && resp.confidence <= 1.0);
        assert!(!resp.debug.pipelines.is_empty());
    }
}
