use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Readiness reported by a WebDriver server's `/status` endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebDriverStatus {
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    value: WebDriverStatus,
}

/// Queries `GET {webdriver_url}/status`
///
/// Fails when the server is unreachable or answers with something other than
/// a W3C status document.
pub async fn check_status(webdriver_url: &str, timeout: Duration) -> Result<WebDriverStatus> {
    let status_url = format!("{}/status", webdriver_url.trim_end_matches('/'));
    debug!("Probing WebDriver status at {}", status_url);

    let client = Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let resp = match client.get(&status_url).send().await {
        Ok(r) => r,
        Err(e) => {
            error!("WebDriver at {} is not reachable: {}", webdriver_url, e);
            return Err(e).context(format!("WebDriver at {} is not reachable", webdriver_url));
        }
    };

    let resp = resp
        .error_for_status()
        .with_context(|| format!("WebDriver status request to {} failed", status_url))?;

    let envelope: StatusEnvelope = resp
        .json()
        .await
        .context("Failed to parse WebDriver status response")?;

    debug!("WebDriver ready={} ({})", envelope.value.ready, envelope.value.message);
    Ok(envelope.value)
}
