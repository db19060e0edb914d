mod cli;
mod payload;
mod server_client;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::cli::CliArgs;
use crate::server_client::ServerClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let body = payload::request_body(&args)?;

    let client = ServerClient::new(&args.host);
    client.health_check().await?;

    debug!(url = %client.analyze_url(), "Sending analyze request");
    let response = client.analyze(&body).await?;

    let pretty = serde_json::to_string_pretty(&response).context("failed to render response")?;
    println!("{}", pretty);
    Ok(())
}
