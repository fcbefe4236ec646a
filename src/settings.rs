//! Settings file describing one or more crawl jobs.
//!
//! Loaded with the `config` crate, so TOML, YAML and JSON are accepted (picked
//! by file extension) and top-level keys can be overridden with
//! `SITE_MIRROR_*` environment variables.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use crate::crawler::CrawlConfig;
use crate::renderer::config::{DEFAULT_WEBDRIVER_URL, MAX_RETRIES};
use crate::renderer::{BrowserConfig, SettleMode};
use crate::utils::duration_from_secs;

const ENV_PREFIX: &str = "SITE_MIRROR";

fn default_webdriver_url() -> String {
    DEFAULT_WEBDRIVER_URL.to_string()
}

fn default_headless() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default)]
    pub viewport: Option<(u32, u32)>,
    #[serde(default)]
    pub jobs: Vec<JobSettings>,
}

/// One seed to crawl into one output directory
#[derive(Debug, Clone, Deserialize)]
pub struct JobSettings {
    pub seed: String,
    pub output: PathBuf,
    #[serde(default)]
    pub allowed_domain: Option<String>,
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub delay_secs: Option<f64>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    #[serde(default)]
    pub settle: SettleMode,
    #[serde(default)]
    pub settle_secs: Option<f64>,
    #[serde(default)]
    pub retries: Option<u32>,
}

impl Settings {
    /// Reads settings from `path`, applying environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .with_context(|| format!("Settings path is not valid UTF-8: {}", path.display()))?;

        let settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(path_str))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("Failed to read settings from {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        if settings.jobs.is_empty() {
            bail!("Settings file {} defines no jobs", path.display());
        }
        Ok(settings)
    }

    /// Browser configuration shared by every job, specialised per job
    pub fn browser_config(&self, job: &JobSettings) -> Result<BrowserConfig> {
        let settle_duration = job.settle_secs.map(duration_from_secs).transpose()?;
        Ok(BrowserConfig::new()
            .with_webdriver_url(self.webdriver_url.clone())
            .with_headless(self.headless)
            .with_viewport_size(self.viewport.or(BrowserConfig::default().viewport_size))
            .with_settle(job.settle.strategy(settle_duration))
            .with_max_retries(job.retries.unwrap_or(MAX_RETRIES)))
    }
}

impl Settings {
    /// Runs every job in order and returns how many of them failed.
    ///
    /// A job whose settings are invalid, or whose `run` returns an error, is
    /// logged and skipped. Remaining jobs are skipped once `shutdown` is set.
    pub async fn run_jobs<F, Fut>(&self, shutdown: &AtomicBool, mut run: F) -> usize
    where
        F: FnMut(CrawlConfig, BrowserConfig) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut failed = 0;
        for (index, job) in self.jobs.iter().enumerate() {
            if shutdown.load(Ordering::Acquire) {
                warn!("Skipping remaining jobs after interrupt");
                break;
            }
            info!("Job {}/{}: {}", index + 1, self.jobs.len(), job.seed);

            let configs = job
                .crawl_config()
                .and_then(|crawl| Ok((crawl, self.browser_config(job)?)));
            let outcome = match configs {
                Ok((crawl, browser)) => run(crawl, browser).await,
                Err(e) => Err(e.context("Invalid job settings")),
            };
            if let Err(e) = outcome {
                error!("Job for {} failed: {:#}", job.seed, e);
                failed += 1;
            }
        }
        failed
    }
}

impl JobSettings {
    pub fn crawl_config(&self) -> Result<CrawlConfig> {
        let mut config = CrawlConfig::new(self.seed.clone(), self.output.clone());
        if let Some(domain) = &self.allowed_domain {
            config = config.with_allowed_domain(domain.clone());
        }
        if let Some(extensions) = &self.allowed_extensions {
            config = config.with_allowed_extensions(extensions.iter().cloned());
        }
        if let Some(delay) = self.delay_secs {
            config = config.with_politeness_delay(duration_from_secs(delay)?);
        }
        if let Some(timeout) = self.timeout_secs {
            config = config.with_navigation_timeout(duration_from_secs(timeout)?);
        }
        Ok(config)
    }
}
