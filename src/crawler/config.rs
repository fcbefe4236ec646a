use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

// Constants for crawler configuration
pub const POLITENESS_DELAY: Duration = Duration::from_secs(1);
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_OUTPUT_DIR: &str = "site_html";

/// Extensions admitted by default: extension-less paths and `.html` files.
pub fn default_extensions() -> BTreeSet<String> {
    ["", ".html"].into_iter().map(String::from).collect()
}

/// Configuration for a single crawl
///
/// Holds the seed, the scope restrictions and the pacing of the crawl.
/// Everything here is fixed for the lifetime of one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_url: String,
    pub output_dir: PathBuf,
    /// Host the crawl is restricted to; defaults to the seed's host
    pub allowed_domain: Option<String>,
    pub allowed_extensions: BTreeSet<String>,

    // Rate limiting and timing
    pub politeness_delay: Duration,
    pub navigation_timeout: Duration,
}

impl CrawlConfig {
    /// Creates a configuration for crawling from `seed_url` into `output_dir`
    pub fn new(seed_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            seed_url: seed_url.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Restricts the crawl to the given host
    pub fn with_allowed_domain(mut self, domain: impl Into<String>) -> Self {
        self.allowed_domain = Some(domain.into());
        self
    }

    /// Replaces the set of admitted path extensions (including the dot)
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the pause between successive page fetches
    pub fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }

    /// Sets the time budget for loading and settling one page
    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            allowed_domain: None,
            allowed_extensions: default_extensions(),
            politeness_delay: POLITENESS_DELAY,
            navigation_timeout: NAVIGATION_TIMEOUT,
        }
    }
}
