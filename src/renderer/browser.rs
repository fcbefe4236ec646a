use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fantoccini::Client;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use crate::renderer::client::{create_client, navigation_timeouts};
use crate::renderer::config::{BrowserConfig, HEALTH_CHECK_TIMEOUT, PAGE_LOAD_TIMEOUT};
use crate::renderer::retry::{render_with_retries, RenderAttempt, RetryPolicy};
use crate::renderer::settle::wait_until_settled;
use crate::renderer::webdriver::check_status;
use crate::renderer::{PageResult, RenderError, Renderer};
use crate::url_parser::NormalizedUrl;

/// Renders pages in a single WebDriver session
///
/// One browser and one tab are reused for every navigation. The session is
/// opened by [`BrowserRenderer::launch`] and released by [`Renderer::close`];
/// dropping an unclosed renderer closes the session in the background.
pub struct BrowserRenderer {
    client: Option<Client>,
    /// Page-load timeout currently set on `client`
    page_load_timeout: Duration,
    config: BrowserConfig,
}

impl fmt::Debug for BrowserRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserRenderer")
            .field("webdriver_url", &self.config.webdriver_url)
            .field("settle", &self.config.settle)
            .field("open", &self.client.is_some())
            .finish()
    }
}

impl BrowserRenderer {
    /// Opens a browser session on the configured WebDriver server
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        debug!("Launching browser renderer via {}", config.webdriver_url);

        let status = check_status(&config.webdriver_url, HEALTH_CHECK_TIMEOUT)
            .await
            .context("WebDriver server is not available")?;
        if !status.ready {
            warn!("WebDriver reports not ready ({}), trying to open a session anyway", status.message);
        }

        let client = create_client(&config, PAGE_LOAD_TIMEOUT).await?;
        info!("Browser session opened (headless: {})", config.headless);

        Ok(Self {
            client: Some(client),
            page_load_timeout: PAGE_LOAD_TIMEOUT,
            config,
        })
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries, self.config.retry_delay)
    }

    /// Navigates the shared tab to `url` and reads back the settled DOM
    async fn render_with_client(
        &self,
        client: &Client,
        url: &NormalizedUrl,
        nav_timeout: Duration,
    ) -> Result<String, RenderError> {
        debug!("Navigating to URL: {}", url);
        match client.goto(url.as_str()).await {
            Ok(_) => trace!("Successfully navigated to {}", url),
            Err(e) => {
                warn!("Failed to navigate to {}: {}", url, e);
                return Err(RenderError::Navigation(e.to_string()));
            }
        }

        wait_until_settled(client, self.config.settle, nav_timeout).await?;

        match client.source().await {
            Ok(html) => {
                trace!("Read {} bytes of rendered HTML from {}", html.len(), url);
                Ok(html)
            }
            Err(e) => {
                warn!("Failed to read page source of {}: {}", url, e);
                Err(RenderError::Content(e.to_string()))
            }
        }
    }

    /// Check if the browser session still answers commands
    async fn is_client_healthy(client: &Client) -> bool {
        match timeout(
            HEALTH_CHECK_TIMEOUT,
            client.execute("return document.readyState", vec![])
        ).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Client failed DOM interaction health check: {}", e);
                false
            },
            Err(_) => {
                debug!("Timeout during DOM interaction health check");
                false
            }
        }
    }

    /// Replaces the session when it stopped responding, e.g. after a crash
    async fn ensure_healthy_session(&mut self, page_load: Duration) -> Result<Client, RenderError> {
        let healthy = match &self.client {
            Some(client) => Self::is_client_healthy(client).await,
            None => false,
        };

        if !healthy {
            if let Some(stale) = self.client.take() {
                debug!("Discarding unhealthy browser session");
                if let Err(e) = within(HEALTH_CHECK_TIMEOUT, "closing unhealthy session", stale.close()).await {
                    warn!("{:#}", e);
                }
            }
            info!("Opening a fresh browser session");
            let client = create_client(&self.config, page_load)
                .await
                .map_err(|e| RenderError::Session(format!("{:#}", e)))?;
            self.page_load_timeout = page_load;
            self.client = Some(client);
        }

        self.client
            .clone()
            .ok_or_else(|| RenderError::Session("no browser session".to_string()))
    }

    /// Keeps the browser's own page-load timeout in line with `page_load`
    async fn sync_page_load_timeout(&mut self, client: &Client, page_load: Duration) -> Result<(), RenderError> {
        if self.page_load_timeout == page_load {
            return Ok(());
        }
        client
            .update_timeouts(navigation_timeouts(page_load))
            .await
            .map_err(|e| RenderError::Session(format!("failed to set page-load timeout: {}", e)))?;
        debug!("Page-load timeout changed from {:?} to {:?}", self.page_load_timeout, page_load);
        self.page_load_timeout = page_load;
        Ok(())
    }
}

/// Awaits `fut` for at most `limit`, turning both its error and a timeout into
/// an error naming `what`
async fn within<T, E, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    E: std::fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    match timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(anyhow!("Error {}: {}", what, e)),
        Err(_) => Err(anyhow!("Gave up {} after {:?}", what, limit)),
    }
}

#[async_trait]
impl RenderAttempt for BrowserRenderer {
    async fn attempt(&mut self, url: &NormalizedUrl, nav_timeout: Duration) -> Result<String, RenderError> {
        let client = match self.ensure_healthy_session(nav_timeout).await {
            Ok(client) => client,
            Err(e) => {
                error!("No usable browser session for {}: {}", url, e);
                return Err(e);
            }
        };
        self.sync_page_load_timeout(&client, nav_timeout).await?;

        match timeout(nav_timeout, self.render_with_client(&client, url, nav_timeout)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Rendering {} timed out after {:?}", url, nav_timeout);
                Err(RenderError::Timeout(nav_timeout))
            }
        }
    }
}

#[async_trait]
impl Renderer for BrowserRenderer {
    async fn render(&mut self, url: &NormalizedUrl, nav_timeout: Duration) -> PageResult {
        let policy = self.retry_policy();
        render_with_retries(self, policy, url, nav_timeout).await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            info!("Closing browser session");
            within(HEALTH_CHECK_TIMEOUT, "closing WebDriver session", client.close()).await?;
        }
        Ok(())
    }
}

impl Drop for BrowserRenderer {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            warn!("BrowserRenderer dropped without close, closing session in background");
            // Can't do async close in drop, so we spawn a task
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = within(HEALTH_CHECK_TIMEOUT, "closing leaked session", client.close()).await {
                            warn!("{:#}", e);
                        }
                    });
                }
                Err(_) => warn!("No runtime available, browser session may be left open"),
            }
        }
    }
}
