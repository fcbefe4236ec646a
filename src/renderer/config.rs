use serde::Deserialize;
use std::time::Duration;

// Constants for rendering behavior
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 800);
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);     // Fixed wait for JS-driven content
pub const NETWORK_QUIET: Duration = Duration::from_millis(500); // Resource-free window counted as idle
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const MAX_RETRIES: u32 = 0;                                // Failed pages are skipped immediately
pub const RETRY_DELAY: Duration = Duration::from_secs(1);      // Base delay, doubled per attempt
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
pub const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);  // Until the first render sets its own

/// How the renderer decides a page is done rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Wait for `<body>`, then sleep for a fixed time
    FixedDelay(Duration),
    /// Wait until the document is complete and no new resources were loaded
    /// for `quiet`, polling every `poll_interval`
    NetworkIdle { quiet: Duration, poll_interval: Duration },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        SettleStrategy::FixedDelay(SETTLE_DELAY)
    }
}

/// Name of a settle strategy as accepted on the command line and in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SettleMode {
    #[default]
    Fixed,
    NetworkIdle,
}

impl SettleMode {
    /// Builds the strategy; `duration` is the fixed delay or the quiet window
    pub fn strategy(self, duration: Option<Duration>) -> SettleStrategy {
        match self {
            SettleMode::Fixed => SettleStrategy::FixedDelay(duration.unwrap_or(SETTLE_DELAY)),
            SettleMode::NetworkIdle => SettleStrategy::NetworkIdle {
                quiet: duration.unwrap_or(NETWORK_QUIET),
                poll_interval: IDLE_POLL_INTERVAL,
            },
        }
    }
}

/// Configuration for the browser session used to render pages
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport_size: Option<(u32, u32)>,
    pub settle: SettleStrategy,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl BrowserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = url.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_viewport_size(mut self, viewport: Option<(u32, u32)>) -> Self {
        self.viewport_size = viewport;
        self
    }

    pub fn with_settle(mut self, settle: SettleStrategy) -> Self {
        self.settle = settle;
        self
    }

    /// Sets how many times a failed render is retried before giving up
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            viewport_size: Some(DEFAULT_VIEWPORT),
            settle: SettleStrategy::default(),
            max_retries: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
        }
    }
}

// Chrome browser arguments
pub fn chrome_arguments(headless: bool, viewport: Option<(u32, u32)>) -> Vec<String> {
    let (width, height) = viewport.unwrap_or(DEFAULT_VIEWPORT);
    let window_size = format!("--window-size={},{}", width, height);

    vec![
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-notifications",
        "--disable-infobars",
        "--disable-background-networking",
        "--disable-breakpad",
        "--disable-features=TranslateUI",
        "--mute-audio",
        window_size.as_str(),
        if headless { "--headless=new" } else { "" }
    ].into_iter()
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

// Chrome content settings preferences
pub fn chrome_preferences() -> serde_json::Map<String, serde_json::Value> {
    let mut prefs = serde_json::Map::new();
    prefs.insert("profile.default_content_setting_values.images".to_string(), 2.into()); // 2 = block, markup only
    prefs.insert("profile.managed_default_content_settings.javascript".to_string(), 1.into()); // 1 = allow
    prefs.insert("profile.managed_default_content_settings.plugins".to_string(), 2.into());
    prefs.insert("profile.managed_default_content_settings.popups".to_string(), 2.into());
    prefs.insert("profile.managed_default_content_settings.geolocation".to_string(), 2.into());
    prefs.insert("profile.managed_default_content_settings.media_stream".to_string(), 2.into());
    prefs
}
