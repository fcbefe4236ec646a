use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use site_mirror::cli::{Cli, Commands, CrawlArgs};
use site_mirror::renderer::config::HEALTH_CHECK_TIMEOUT;
use site_mirror::renderer::webdriver::check_status;
use site_mirror::settings::Settings;
use site_mirror::utils::duration_from_secs;
use site_mirror::utils::logger::init_logger;
use site_mirror::{BrowserConfig, BrowserRenderer, CrawlConfig, CrawlSummary, Crawler};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_dir.as_deref(), cli.verbose)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current page");
                shutdown.store(true, Ordering::Release);
            }
        });
    }

    match cli.command {
        Commands::Crawl(args) => run_single(args, shutdown).await,
        Commands::Run { config, json } => {
            let settings = Settings::load(&config)?;
            info!("Loaded {} crawl jobs from {}", settings.jobs.len(), config.display());

            let failed_jobs = settings
                .run_jobs(&shutdown, |crawl_config, browser_config| {
                    let shutdown = shutdown.clone();
                    async move {
                        let summary = crawl(crawl_config, browser_config, shutdown).await?;
                        print_summary(&summary, json)
                    }
                })
                .await;
            if failed_jobs > 0 {
                bail!("{} of {} crawl jobs failed to run", failed_jobs, settings.jobs.len());
            }
            Ok(())
        }
        Commands::Check { webdriver } => {
            let status = check_status(&webdriver, HEALTH_CHECK_TIMEOUT).await?;
            println!(
                "{} {} ({})",
                webdriver,
                if status.ready { "ready" } else { "not ready" },
                status.message
            );
            Ok(())
        }
    }
}

async fn run_single(args: CrawlArgs, shutdown: Arc<AtomicBool>) -> Result<()> {
    let mut crawl_config = CrawlConfig::new(args.seed, args.output)
        .with_politeness_delay(duration_from_secs(args.delay)?)
        .with_navigation_timeout(duration_from_secs(args.timeout)?);
    if let Some(domain) = args.domain {
        crawl_config = crawl_config.with_allowed_domain(domain);
    }

    let settle_duration = args.settle_secs.map(duration_from_secs).transpose()?;
    let browser_config = BrowserConfig::new()
        .with_webdriver_url(args.webdriver)
        .with_headless(!args.no_headless)
        .with_settle(args.settle.strategy(settle_duration))
        .with_max_retries(args.retries);

    let summary = crawl(crawl_config, browser_config, shutdown).await?;
    print_summary(&summary, args.json)
}

async fn crawl(
    crawl_config: CrawlConfig,
    browser_config: BrowserConfig,
    shutdown: Arc<AtomicBool>,
) -> Result<CrawlSummary> {
    let renderer = BrowserRenderer::launch(browser_config)
        .await
        .context("Failed to start browser")?;
    Crawler::new(renderer, crawl_config)
        .with_shutdown_flag(shutdown)
        .run()
        .await
}

fn print_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Crawl of {}", summary.seed);
    println!("  Output:          {}", summary.output_dir.display());
    println!("  Visited:         {}", summary.visited);
    println!("  Saved:           {}", summary.saved.len());
    println!("  Render failures: {}", summary.render_failures.len());
    for failure in &summary.render_failures {
        println!("    {} ({})", failure.url, failure.reason);
    }
    if !summary.write_failures.is_empty() {
        println!("  Write failures:  {}", summary.write_failures.len());
        for failure in &summary.write_failures {
            println!("    {} ({})", failure.url, failure.reason);
        }
    }
    if summary.cancelled {
        println!("  Cancelled with {} URLs pending", summary.pending);
    }
    println!("  Elapsed:         {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    Ok(())
}
