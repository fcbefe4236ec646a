//! Page rendering through a browser engine.
//!
//! The crawler talks to a [`Renderer`]; [`BrowserRenderer`] is the WebDriver
//! backed implementation that owns a single browser session.

pub mod browser;
pub mod client;
pub mod config;
pub mod retry;
pub mod settle;
pub mod webdriver;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::url_parser::NormalizedUrl;

pub use browser::BrowserRenderer;
pub use config::{BrowserConfig, SettleMode, SettleStrategy};
pub use retry::RetryPolicy;

/// Why a page could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("page did not settle: {0}")]
    Settle(String),
    #[error("failed to read rendered page: {0}")]
    Content(String),
    #[error("browser session unavailable: {0}")]
    Session(String),
}

/// Outcome of rendering one URL
#[derive(Debug, Clone)]
pub enum PageResult {
    Rendered { url: NormalizedUrl, html: String },
    Failed { url: NormalizedUrl, error: RenderError },
}

impl PageResult {
    pub fn url(&self) -> &NormalizedUrl {
        match self {
            PageResult::Rendered { url, .. } | PageResult::Failed { url, .. } => url,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PageResult::Rendered { .. })
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            PageResult::Rendered { html, .. } => Some(html),
            PageResult::Failed { .. } => None,
        }
    }
}

/// Something that turns a URL into its fully rendered HTML.
///
/// `render` takes `&mut self`: a renderer drives one page at a time and is
/// never shared between concurrent navigations.
#[async_trait]
pub trait Renderer: Send {
    /// Loads `url` and returns its serialized DOM once the page has settled.
    ///
    /// Failures are reported as [`PageResult::Failed`], never as errors, and
    /// `timeout` bounds the whole navigation including the settle wait.
    async fn render(&mut self, url: &NormalizedUrl, timeout: Duration) -> PageResult;

    /// Releases the underlying browser resources
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
