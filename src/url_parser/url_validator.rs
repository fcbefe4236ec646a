use anyhow::{bail, Result};
use tracing::error;

use crate::url_parser::NormalizedUrl;

// Constants for validation
const MAX_URL_LENGTH: usize = 2048;  // Maximum allowable URL length

/// Validates a seed URL before a crawl starts and returns it normalized
pub fn validate_seed(url: &str) -> Result<NormalizedUrl> {
    let url = url.trim();
    if url.is_empty() {
        error!("Received empty seed URL");
        bail!("URL cannot be empty");
    }

    if url.len() > MAX_URL_LENGTH {
        error!("Seed URL exceeds maximum length: {} > {}", url.len(), MAX_URL_LENGTH);
        bail!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH);
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        error!("Seed URL lacks proper protocol: {}", url);
        bail!("URL must start with http:// or https://");
    }

    let seed = NormalizedUrl::parse(url)?;
    if seed.host_str().map_or(true, str::is_empty) {
        error!("Seed URL has no host component: {}", url);
        bail!("URL must contain a host");
    }

    Ok(seed)
}

/// Extracts the host a crawl is restricted to when none is given explicitly
pub fn default_domain(seed: &NormalizedUrl) -> Result<String> {
    match seed.host_str() {
        Some(host) => Ok(host.to_string()),
        None => bail!("URL '{}' has no host component", seed),
    }
}
