use anyhow::{Context, Result};
use std::path::Path;
use std::fs;
use chrono::Local;
use tracing::info;
use tracing_subscriber::{FmtSubscriber, EnvFilter};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `info`, or
/// `debug` when `verbose` is set. With a `log_dir` the output goes to a
/// timestamped file in that directory instead of stderr.
pub fn init_logger(log_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let default_directive = if verbose { "site_mirror=debug" } else { "site_mirror=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_target(false);

    match log_dir {
        Some(log_dir) => {
            if !log_dir.exists() {
                fs::create_dir_all(log_dir)
                    .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
            }

            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            let log_file = log_dir.join(format!("site_mirror_{}.log", timestamp));
            let file = fs::File::create(&log_file)
                .with_context(|| format!("Failed to create log file: {}", log_file.display()))?;

            let subscriber = builder.with_ansi(false).with_writer(std::sync::Mutex::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)?;
            info!("Logging to {}", log_file.display());
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
