use fantoccini::{Client, Locator};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::renderer::config::SettleStrategy;
use crate::renderer::RenderError;

// Browsers stop recording resource timings after 250 entries by default,
// which would freeze the count on resource-heavy pages
const RESOURCE_BUFFER_SIZE: u32 = 10_000;

fn idle_probe_script() -> String {
    format!(
        "performance.setResourceTimingBufferSize({}); \
         return [document.readyState, performance.getEntriesByType('resource').length];",
        RESOURCE_BUFFER_SIZE
    )
}

/// Blocks until the current page is considered rendered.
///
/// The caller bounds the total time spent here with its navigation timeout.
pub async fn wait_until_settled(
    client: &Client,
    strategy: SettleStrategy,
    body_timeout: Duration,
) -> Result<(), RenderError> {
    match strategy {
        SettleStrategy::FixedDelay(delay) => {
            debug!("Waiting for page body to load");
            client
                .wait()
                .at_most(body_timeout)
                .for_element(Locator::Css("body"))
                .await
                .map_err(|e| RenderError::Settle(format!("body never appeared: {}", e)))?;
            trace!("Body element found, waiting {:?} for scripts", delay);
            sleep(delay).await;
            Ok(())
        }
        SettleStrategy::NetworkIdle { quiet, poll_interval } => {
            wait_for_network_idle(client, quiet, poll_interval).await
        }
    }
}

async fn wait_for_network_idle(
    client: &Client,
    quiet: Duration,
    poll_interval: Duration,
) -> Result<(), RenderError> {
    debug!("Waiting for {:?} without new network activity", quiet);
    let script = idle_probe_script();
    let mut last_count = None;
    let mut quiet_since = Instant::now();

    loop {
        let value = client
            .execute(&script, vec![])
            .await
            .map_err(|e| RenderError::Settle(format!("idle probe failed: {}", e)))?;
        let (ready_state, resources) = parse_idle_probe(&value)?;

        if last_count != Some(resources) {
            trace!("Page state '{}' with {} resources loaded", ready_state, resources);
            last_count = Some(resources);
            quiet_since = Instant::now();
        } else if ready_state == "complete" && quiet_since.elapsed() >= quiet {
            debug!("Network idle with {} resources loaded", resources);
            return Ok(());
        }

        sleep(poll_interval).await;
    }
}

fn parse_idle_probe(value: &serde_json::Value) -> Result<(&str, u64), RenderError> {
    let state = value.get(0).and_then(serde_json::Value::as_str);
    let resources = value.get(1).and_then(serde_json::Value::as_u64);
    match (state, resources) {
        (Some(state), Some(resources)) => Ok((state, resources)),
        _ => Err(RenderError::Settle(format!("unexpected idle probe result: {}", value))),
    }
}
