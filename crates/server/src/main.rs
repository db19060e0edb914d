use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;
use trustbot_core::Config;
use trustbot_engine::TrustEngine;
use trustbot_server::{build_router, AppState};
use trustbot_storage::MemoryEvidenceStore;

fn load_config() -> Config {
    trustbot_core::config::load_dotenv();
    Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config();
    config.log_summary();

    let engine = TrustEngine::from_config(&config)?;
    info!("OCR available: {}", engine.ocr_available());

    let state = Arc::new(AppState {
        engine,
        evidence: Arc::new(MemoryEvidenceStore::from_config(&config.store)),
        evidence_ttl: Duration::from_secs(config.store.ttl_secs),
    });

    let app = build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
