//! Ephemeral evidence context keyed by content receipts.

pub mod error;
pub mod evidence;

pub use error::StorageError;
pub use evidence::{EvidenceStore, MemoryEvidenceStore};

use sha2::{Digest, Sha256};
use trustbot_core::config::StoreConfig;

/// Lowercase hex SHA-256 of the raw media bytes.
pub fn receipt_for_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl MemoryEvidenceStore {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.max_entries)
    }
}
