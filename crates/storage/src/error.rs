use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("evidence store lock poisoned")]
    Poisoned,

    #[error("invalid ttl: {0}")]
    InvalidTtl(String),
}

impl From<StorageError> for trustbot_core::TrustbotError {
    fn from(e: StorageError) -> Self {
        trustbot_core::TrustbotError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustbot_core::TrustbotError;

    #[test]
    fn converts_to_storage_kind() {
        let err: TrustbotError = StorageError::InvalidTtl("too large".into()).into();
        assert_eq!(err.kind(), "storage");
        assert_eq!(err.to_string(), "Storage error: invalid ttl: too large");
    }
}
