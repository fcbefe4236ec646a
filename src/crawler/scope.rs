use anyhow::Result;
use std::collections::BTreeSet;
use tracing::trace;

use crate::crawler::config::CrawlConfig;
use crate::url_parser::{default_domain, path_extension, validate_seed, NormalizedUrl};

/// Admission policy keeping a crawl on one host, under the seed URL, and on
/// page-like resources.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    seed: NormalizedUrl,
    allowed_domain: String,
    path_prefix: String,
    allowed_extensions: BTreeSet<String>,
}

impl ScopeFilter {
    /// `allowed_domain` is compared case-insensitively, since parsed URLs
    /// always carry lowercase hosts.
    pub fn new(
        seed: NormalizedUrl,
        allowed_domain: impl Into<String>,
        allowed_extensions: BTreeSet<String>,
    ) -> Self {
        let path_prefix = seed.as_str().to_string();
        Self {
            seed,
            allowed_domain: allowed_domain.into().to_ascii_lowercase(),
            path_prefix,
            allowed_extensions,
        }
    }

    /// Builds the scope from a crawl configuration, validating the seed
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let seed = validate_seed(&config.seed_url)?;
        let domain = match &config.allowed_domain {
            Some(domain) => domain.clone(),
            None => default_domain(&seed)?,
        };
        Ok(Self::new(seed, domain, config.allowed_extensions.clone()))
    }

    pub fn seed(&self) -> &NormalizedUrl {
        &self.seed
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Returns true when `url` may enter the frontier.
    ///
    /// The host must equal the allowed domain exactly, the URL must start with
    /// the seed URL, and the path extension must be in the allowed set.
    pub fn admits(&self, url: &NormalizedUrl) -> bool {
        if url.host_str() != Some(self.allowed_domain.as_str()) {
            trace!("Rejecting {}: host outside {}", url, self.allowed_domain);
            return false;
        }
        if !url.as_str().starts_with(&self.path_prefix) {
            trace!("Rejecting {}: not under {}", url, self.path_prefix);
            return false;
        }
        let extension = path_extension(url.path());
        if !self.allowed_extensions.contains(extension) {
            trace!("Rejecting {}: extension '{}' not allowed", url, extension);
            return false;
        }
        true
    }
}
