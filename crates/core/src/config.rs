use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub fusion: FusionConfig,
    pub escalation: EscalationConfig,
    pub analyzers: AnalyzerConfig,
    pub engine: EngineConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TRUSTBOT_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("TRUSTBOT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            fusion: FusionConfig::from_env_profiled(p),
            escalation: EscalationConfig::from_env_profiled(p),
            analyzers: AnalyzerConfig::from_env_profiled(p),
            engine: EngineConfig::from_env_profiled(p),
            store: StoreConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  fusion:      unsure<{} risky>={} safe<={} w_amb={} w_q={}",
            self.fusion.unsure_below,
            self.fusion.risky_at,
            self.fusion.safe_at,
            self.fusion.ambiguity_weight,
            self.fusion.quality_weight
        );
        tracing::info!("  escalation:  answer_at={}", self.escalation.answer_at);
        tracing::info!(
            "  analyzers:   fetch_timeout={}s max_bytes={} fanout={} tesseract={} ocr_timeout={}s",
            self.analyzers.provenance_timeout_secs,
            self.analyzers.provenance_max_bytes,
            self.analyzers.url_fanout,
            self.analyzers.tesseract_cmd,
            self.analyzers.ocr_timeout_secs
        );
        tracing::info!("  engine:      deadline={}s", self.engine.request_deadline_secs);
        tracing::info!(
            "  store:       ttl={}s max_entries={}",
            self.store.ttl_secs,
            self.store.max_entries
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_body_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origin: "*".to_string(),
            max_body_mb: 16,
        }
    }
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            host: profiled_env_or(p, "HOST", &d.host),
            port: profiled_env_parse(p, "PORT", d.port),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", &d.cors_origin),
            max_body_mb: profiled_env_parse(p, "MAX_BODY_MB", d.max_body_mb),
        }
    }
}

// ── Fusion calibration ────────────────────────────────────────

/// The entire calibration surface of the fusion engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Confidence strictly below this is always UNSURE.
    pub unsure_below: f64,
    /// Risk at or above this (with enough confidence) is RISKY.
    pub risky_at: f64,
    /// Risk at or below this (with enough confidence) is SAFE.
    pub safe_at: f64,
    /// Weight of risk ambiguity in the confidence penalty.
    pub ambiguity_weight: f64,
    /// Weight of the aggregate quality penalty in the confidence penalty.
    pub quality_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            unsure_below: 0.45,
            risky_at: 0.65,
            safe_at: 0.35,
            ambiguity_weight: 0.65,
            quality_weight: 0.5,
        }
    }
}

impl FusionConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            unsure_below: profiled_env_parse(p, "FUSION_UNSURE_BELOW", d.unsure_below),
            risky_at: profiled_env_parse(p, "FUSION_RISKY_AT", d.risky_at),
            safe_at: profiled_env_parse(p, "FUSION_SAFE_AT", d.safe_at),
            ambiguity_weight: profiled_env_parse(p, "FUSION_AMBIGUITY_WEIGHT", d.ambiguity_weight),
            quality_weight: profiled_env_parse(p, "FUSION_QUALITY_WEIGHT", d.quality_weight),
        }
    }
}

// ── Evidence escalation ───────────────────────────────────────

/// Kept apart from [`FusionConfig`]: "certain enough to answer" and
/// "certain enough to call it risky" are separate policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Answer directly (no evidence request) at or above this confidence,
    /// unless the verdict is UNSURE.
    pub answer_at: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self { answer_at: 0.6 }
    }
}

impl EscalationConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            answer_at: profiled_env_parse(p, "ESCALATION_ANSWER_AT", Self::default().answer_at),
        }
    }
}

// ── Analyzer pipelines ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub provenance_timeout_secs: u64,
    pub provenance_max_bytes: usize,
    pub provenance_max_redirects: usize,
    pub provenance_user_agent: String,
    /// Concurrent URL/provenance checks per request.
    pub url_fanout: usize,
    /// Distinct URLs followed from one text.
    pub max_embedded_urls: usize,
    pub tesseract_cmd: String,
    /// The OCR process is killed after this long.
    pub ocr_timeout_secs: u64,
    pub pdf_max_pages: usize,
    /// Extracted document text handed to the text scanner.
    pub doc_max_text_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provenance_timeout_secs: 6,
            provenance_max_bytes: 200_000,
            provenance_max_redirects: 5,
            provenance_user_agent: "TrustBotMVP/0.2".to_string(),
            url_fanout: 4,
            max_embedded_urls: 10,
            tesseract_cmd: "tesseract".to_string(),
            ocr_timeout_secs: 10,
            pdf_max_pages: 3,
            doc_max_text_chars: 4000,
        }
    }
}

impl AnalyzerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            provenance_timeout_secs: profiled_env_parse(p, "PROVENANCE_TIMEOUT_SECS", d.provenance_timeout_secs),
            provenance_max_bytes: profiled_env_parse(p, "PROVENANCE_MAX_BYTES", d.provenance_max_bytes),
            provenance_max_redirects: profiled_env_parse(p, "PROVENANCE_MAX_REDIRECTS", d.provenance_max_redirects),
            provenance_user_agent: profiled_env_or(p, "PROVENANCE_USER_AGENT", &d.provenance_user_agent),
            url_fanout: profiled_env_parse(p, "URL_FANOUT", d.url_fanout).max(1),
            max_embedded_urls: profiled_env_parse(p, "MAX_EMBEDDED_URLS", d.max_embedded_urls),
            tesseract_cmd: profiled_env_or(p, "TESSERACT_CMD", &d.tesseract_cmd),
            ocr_timeout_secs: profiled_env_parse(p, "OCR_TIMEOUT_SECS", d.ocr_timeout_secs),
            pdf_max_pages: profiled_env_parse(p, "PDF_MAX_PAGES", d.pdf_max_pages),
            doc_max_text_chars: profiled_env_parse(p, "DOC_MAX_TEXT_CHARS", d.doc_max_text_chars),
        }
    }
}

// ── Engine ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overall per-request deadline covering every pipeline.
    pub request_deadline_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { request_deadline_secs: 20 }
    }
}

impl EngineConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            request_deadline_secs: profiled_env_parse(p, "REQUEST_DEADLINE_SECS", Self::default().request_deadline_secs),
        }
    }
}

// ── Evidence store ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 30,
            max_entries: 10_000,
        }
    }
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            ttl_secs: profiled_env_parse(p, "EVIDENCE_TTL_SECS", d.ttl_secs),
            max_entries: profiled_env_parse(p, "EVIDENCE_MAX_ENTRIES", d.max_entries).max(1),
        }
    }
}
