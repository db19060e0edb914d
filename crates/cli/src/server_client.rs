//! HTTP client for the trustbot server's analyze API.

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub struct ServerClient {
    base_url: String,
    http: reqwest::Client,
}

impl ServerClient {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();
        Self { base_url, http }
    }

    pub fn analyze_url(&self) -> String {
        format!("{}/v1/analyze", self.base_url)
    }

    /// Check if the server is reachable.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/healthz", self.base_url);
        self.http
            .get(&url)
            .timeout(std::time::Duration::from_secs(3))
            .send()
            .await
            .with_context(|| format!("server not reachable at {}", self.base_url))?;
        Ok(())
    }

    /// POST an analyze body and return the server's JSON response.
    pub async fn analyze(&self, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.analyze_url())
            .json(body)
            .send()
            .await
            .context("failed to send analyze request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("server returned {}: {}", status, body);
        }

        resp.json().await.context("failed to parse analyze response")
    }
}
