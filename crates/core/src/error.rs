use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrustbotError {
    /// The caller's overall deadline expired before every pipeline returned.
    /// Nothing is fused in this case.
    #[error("Analysis deadline exceeded after {millis}ms")]
    DeadlineExceeded { millis: u64 },

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl TrustbotError {
    /// Short machine-readable tag for API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            TrustbotError::DeadlineExceeded { .. } => "deadline_exceeded",
            TrustbotError::Serialize(_) => "serialize",
            TrustbotError::Storage(_) => "storage",
            TrustbotError::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for TrustbotError {
    fn from(e: serde_json::Error) -> Self {
        TrustbotError::Serialize(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrustbotError>;
