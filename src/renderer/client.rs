use anyhow::{Context, Result};
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::renderer::config::{chrome_arguments, chrome_preferences, BrowserConfig};

/// Session capabilities: Chrome arguments and content preferences
pub fn chrome_capabilities(browser: &BrowserConfig) -> Map<String, Value> {
    let options = json!({
        "args": chrome_arguments(browser.headless, browser.viewport_size),
        "prefs": chrome_preferences(),
    });

    let mut caps = Map::new();
    caps.insert("goog:chromeOptions".to_string(), options);
    caps
}

/// Session timeouts where the browser itself abandons a page load after
/// `page_load`. Scripts and implicit waits keep the WebDriver defaults.
pub fn navigation_timeouts(page_load: Duration) -> TimeoutConfiguration {
    TimeoutConfiguration::new(None, Some(page_load), None)
}

/// Opens a browser session for rendering pages.
///
/// The page-load timeout is set on the session, so a page that never
/// finishes loading is aborted by the browser and doesn't keep the session
/// busy after the caller gave up on it.
pub async fn create_client(browser: &BrowserConfig, page_load: Duration) -> Result<Client> {
    let caps = chrome_capabilities(browser);
    trace!("Session capabilities: {}", serde_json::Value::Object(caps.clone()));

    let client = ClientBuilder::native()
        .capabilities(caps)
        .connect(&browser.webdriver_url)
        .await
        .with_context(|| format!("Failed to open a browser session on {}", browser.webdriver_url))?;

    client
        .update_timeouts(navigation_timeouts(page_load))
        .await
        .context("Failed to set the page-load timeout")?;
    debug!("Page-load timeout set to {:?}", page_load);

    if let Some((width, height)) = browser.viewport_size {
        // Rendering still works at the default size
        if let Err(e) = client.set_window_size(width, height).await {
            warn!("Could not resize window to {}x{}: {}", width, height, e);
        }
    }

    Ok(client)
}
