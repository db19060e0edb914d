use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde_json::Value;
use tracing::debug;

use crate::error::StorageError;

/// Key/value store for short-lived evidence context.
///
/// Entries expire after their TTL; an expired entry reads as absent.
pub trait EvidenceStore: Send + Sync {
    fn put(&self, key: &str, payload: Value, ttl: Duration) -> Result<(), StorageError>;

    /// Fetch a live entry. Expired entries are dropped and read as `None`.
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Remove an entry. Returns whether anything was removed.
    fn purge(&self, key: &str) -> Result<bool, StorageError>;
}

struct StoredEvidence {
    payload: Value,
    expires_at: DateTime<Utc>,
}

/// In-process evidence store, bounded by entry count (LRU eviction).
pub struct MemoryEvidenceStore {
    entries: Mutex<LruCache<String, StoredEvidence>>,
}

impl MemoryEvidenceStore {
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EvidenceStore for MemoryEvidenceStore {
    fn put(&self, key: &str, payload: Value, ttl: Duration) -> Result<(), StorageError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| StorageError::InvalidTtl(e.to_string()))?;
        let expires_at = Utc::now() + ttl;
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if let Some((evicted, _)) = entries.push(key.to_string(), StoredEvidence { payload, expires_at }) {
            if evicted != key {
                debug!("Evicting evidence entry: {}", evicted);
            }
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.expires_at > Utc::now() => return Ok(Some(entry.payload.clone())),
            Some(_) => true,
        };
        if expired {
            debug!("Evidence entry expired: {}", key);
            entries.pop(key);
        }
        Ok(None)
    }

    fn purge(&self, key: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.pop(key).is_some())
    }
}
