use std::sync::Arc;
use std::time::Duration;

use trustbot_engine::TrustEngine;
use trustbot_storage::EvidenceStore;

pub struct AppState {
    pub engine: TrustEngine,
    pub evidence: Arc<dyn EvidenceStore>,
    /// How long a pending evidence request is remembered.
    pub evidence_ttl: Duration,
}
