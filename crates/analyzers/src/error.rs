use thiserror::Error;

/// Failures inside an analyzer. Never leaves the owning pipeline: each one
/// is folded into a degraded `PipelineResult`.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("capability unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(e: reqwest::Error) -> Self {
        AnalyzerError::Fetch(e.to_string())
    }
}

impl From<url::ParseError> for AnalyzerError {
    fn from(e: url::ParseError) -> Self {
        AnalyzerError::InvalidUrl(e.to_string())
    }
}

impl From<image::ImageError> for AnalyzerError {
    fn from(e: image::ImageError) -> Self {
        AnalyzerError::Decode(e.to_string())
    }
}
