//! Scoped recursive crawl: render, persist, extract, enqueue, repeat until the
//! frontier is exhausted.

pub mod config;
pub mod frontier;
pub mod scope;

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::extractor::extract_links;
use crate::renderer::{PageResult, Renderer};
use crate::storage::PageWriter;
use crate::url_parser::NormalizedUrl;

pub use config::CrawlConfig;
pub use frontier::Frontier;
pub use scope::ScopeFilter;

// Granularity at which the politeness delay notices cancellation
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A page that was visited but produced no file
#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub url: NormalizedUrl,
    pub reason: String,
}

/// What a finished crawl did
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub output_dir: PathBuf,
    /// URLs taken from the frontier
    pub visited: usize,
    /// Pages the renderer returned HTML for
    pub rendered: usize,
    /// Files written under the output directory
    pub saved: Vec<PathBuf>,
    pub render_failures: Vec<PageFailure>,
    pub write_failures: Vec<PageFailure>,
    /// In-scope URLs still queued when the crawl stopped
    pub pending: usize,
    pub cancelled: bool,
    pub elapsed_ms: u128,
}

/// Drives a crawl from the seed until no in-scope URL is left
pub struct Crawler<R: Renderer> {
    renderer: R,
    config: CrawlConfig,
    shutdown_requested: Arc<AtomicBool>,
}

impl<R: Renderer> Crawler<R> {
    pub fn new(renderer: R, config: CrawlConfig) -> Self {
        Self {
            renderer,
            config,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an externally owned cancellation flag
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_requested = flag;
        self
    }

    /// Flag that stops the crawl at the next page boundary once set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown_requested.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Runs the crawl to completion and closes the renderer.
    ///
    /// Only setup problems (invalid seed, unusable output directory) are
    /// returned as errors. Pages that fail to render or to be written are
    /// recorded in the summary and the crawl moves on.
    #[instrument(skip(self), fields(seed = %self.config.seed_url))]
    pub async fn run(mut self) -> Result<CrawlSummary> {
        let outcome = self.crawl().await;
        if let Err(e) = self.renderer.close().await {
            warn!("Failed to close renderer: {:#}", e);
        }
        outcome
    }

    async fn crawl(&mut self) -> Result<CrawlSummary> {
        let started = Instant::now();
        let scope = ScopeFilter::from_config(&self.config)?;
        let writer = PageWriter::new(self.config.output_dir.clone());
        writer.prepare().await?;

        info!(
            "Starting crawl of {} (domain: {}, output: {})",
            scope.seed(),
            scope.allowed_domain(),
            writer.root().display()
        );

        let mut summary = CrawlSummary {
            seed: scope.seed().to_string(),
            output_dir: writer.root().to_path_buf(),
            ..CrawlSummary::default()
        };
        let mut frontier = Frontier::new(scope.seed().clone());

        loop {
            // Selecting
            if self.is_cancelled() {
                warn!("Crawl cancelled with {} URLs still pending", frontier.pending_len());
                summary.cancelled = true;
                break;
            }
            let Some(url) = frontier.pop() else {
                break;
            };
            summary.visited += 1;
            info!("Visiting [{}]: {}", summary.visited, url);

            // Rendering
            let html = match self.renderer.render(&url, self.config.navigation_timeout).await {
                PageResult::Rendered { html, .. } => html,
                PageResult::Failed { error, .. } => {
                    warn!("Skipping {}: {}", url, error);
                    summary.render_failures.push(PageFailure { url, reason: error.to_string() });
                    continue;
                }
            };
            summary.rendered += 1;

            // Persisting
            match writer.write_page(&url, &html).await {
                Ok(path) => summary.saved.push(path),
                Err(e) => {
                    error!("Failed to save {}: {:#}", url, e);
                    summary.write_failures.push(PageFailure { url, reason: format!("{:#}", e) });
                    self.politeness_pause(&frontier).await;
                    continue;
                }
            }

            // Extracting and enqueueing
            let mut queued = 0usize;
            for link in extract_links(&html, &url) {
                if !scope.admits(&link) {
                    continue;
                }
                if frontier.push(link.clone()) {
                    trace!("Queued {}", link);
                    queued += 1;
                }
            }
            debug!("Queued {} new URLs from {} ({} pending)", queued, url, frontier.pending_len());

            self.politeness_pause(&frontier).await;
        }

        summary.pending = frontier.pending_len();
        summary.elapsed_ms = started.elapsed().as_millis();
        info!(
            "Crawl finished: {} visited, {} saved, {} render failures, {} write failures in {:?}",
            summary.visited,
            summary.saved.len(),
            summary.render_failures.len(),
            summary.write_failures.len(),
            started.elapsed()
        );
        Ok(summary)
    }

    /// Waits out the politeness delay unless there is nothing left to fetch
    async fn politeness_pause(&self, frontier: &Frontier) {
        if frontier.is_empty() || self.config.politeness_delay.is_zero() {
            return;
        }
        trace!("Rate limiting: waiting for {:?}", self.config.politeness_delay);
        let deadline = Instant::now() + self.config.politeness_delay;
        while !self.is_cancelled() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(remaining.min(CANCEL_POLL_INTERVAL)).await;
        }
    }
}
