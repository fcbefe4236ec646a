use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::renderer::config::DEFAULT_WEBDRIVER_URL;
use crate::renderer::SettleMode;

/// Mirror a JavaScript-rendered website into a local directory of HTML files
#[derive(Parser, Debug)]
#[command(name = "site_mirror", version)]
pub struct Cli {
    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl one site starting from a seed URL
    ///
    /// Example: site_mirror crawl https://ai.google.dev/gemini-api/docs/ --output gemini_api_docs_html
    Crawl(CrawlArgs),

    /// Run every crawl job listed in a settings file, one after another
    Run {
        /// Settings file (TOML, YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Print each job's summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the WebDriver server is up and accepting sessions
    Check {
        #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
        webdriver: String,
    },
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// URL the crawl starts from; only URLs beneath it are followed
    pub seed: String,

    /// Directory the rendered pages are written to
    #[arg(short, long)]
    pub output: PathBuf,

    /// Host to stay on (defaults to the seed's host)
    #[arg(long)]
    pub domain: Option<String>,

    /// Seconds to wait between page fetches
    #[arg(long, default_value_t = 1.0)]
    pub delay: f64,

    /// Seconds allowed for loading and settling one page
    #[arg(long, default_value_t = 30.0)]
    pub timeout: f64,

    /// How to decide that a page has finished rendering
    #[arg(long, value_enum, default_value_t = SettleMode::Fixed)]
    pub settle: SettleMode,

    /// Fixed settle delay, or the quiet window for network-idle, in seconds
    #[arg(long)]
    pub settle_secs: Option<f64>,

    /// Extra attempts for a page that fails to render
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
    pub webdriver: String,

    /// Show the browser window
    #[arg(long)]
    pub no_headless: bool,

    /// Print the crawl summary as JSON
    #[arg(long)]
    pub json: bool,
}
