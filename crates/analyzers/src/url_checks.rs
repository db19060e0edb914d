//! Lexical URL checks: everything that can be judged without fetching.

use trustbot_core::{PipelineResult, ReasonCode};
use url::{Host, Url};

pub const PIPELINE: &str = "url_checks";

const SHORTENERS: &[&str] = &["bit.ly", "t.co", "tinyurl.com", "goo.gl", "is.gd", "cutt.ly"];
const SUSPICIOUS_TLDS: &[&str] = &["zip", "mov", "top", "xyz", "click", "cam", "quest"];

/// Words in a URL that suggest a credential or verification page.
pub const LOGIN_HINTS: &[&str] = &[
    "login", "signin", "sign-in", "verify", "password", "otp", "kyc", "bank", "wallet",
];

pub fn has_login_hint(url: &str) -> bool {
    let lower = url.to_lowercase();
    LOGIN_HINTS.iter().any(|k| lower.contains(k))
}

/// Lowercased host and scheme, empty when the URL does not parse.
fn host_and_scheme(url: &str) -> (Option<Url>, String, String) {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default().to_lowercase();
            let scheme = parsed.scheme().to_lowercase();
            (Some(parsed), host, scheme)
        }
        Err(_) => (None, String::new(), String::new()),
    }
}

pub fn analyze_url(url: &str) -> PipelineResult {
    let u = url.trim();
    if u.is_empty() {
        return PipelineResult::missing(PIPELINE, "url");
    }

    let (parsed, host, scheme) = host_and_scheme(u);
    let mut out = PipelineResult::new(PIPELINE);

    if SHORTENERS.contains(&host.as_str()) {
        out.flag(
            "url_shortener",
            0.75,
            "Link uses a URL shortener, which often hides the true destination.",
            ReasonCode::UrlShortener,
        );
    }

    let ip_literal = matches!(
        parsed.as_ref().and_then(|p| p.host()),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_))
    );
    if ip_literal {
        out.flag(
            "ip_literal",
            0.8,
            "Link uses a raw IP address, which is uncommon for legitimate services.",
            ReasonCode::UrlIpLiteral,
        );
    }

    if !scheme.is_empty() && scheme != "https" {
        out.flag("no_tls", 0.6, "Link is not HTTPS.", ReasonCode::UrlNoTls);
    }

    if host.contains("xn--") {
        out.flag(
            "punycode",
            0.7,
            "Link uses punycode (possible lookalike domain).",
            ReasonCode::UrlPunycode,
        );
    }

    if !ip_literal && host.contains('.') {
        if let Some(tld) = host.rsplit('.').next() {
            if SUSPICIOUS_TLDS.contains(&tld) {
                out.flag(
                    "suspicious_tld",
                    0.65,
                    format!("Domain ends with .{}, which is frequently abused.", tld),
                    ReasonCode::UrlSuspiciousTld,
                );
            }
        }
    }

    if has_login_hint(u) {
        out.flag(
            "login_keywords",
            0.6,
            "URL contains login or verification keywords often used in phishing.",
            ReasonCode::UrlLoginKeywords,
        );
    }

    if out.signals.is_empty() {
        out.push_signal("no_strong_url_indicators", 0.45);
    }

    out.note("host", host);
    out.note("scheme", scheme);
    out
}
