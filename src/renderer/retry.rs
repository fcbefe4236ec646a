use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::renderer::{PageResult, RenderError};
use crate::url_parser::NormalizedUrl;

/// How often a failed render is repeated and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Wait before the first retry, doubled for every further one
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self { max_retries, retry_delay }
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.retry_delay.saturating_mul(factor)
    }
}

/// A single try at rendering a page
#[async_trait]
pub trait RenderAttempt: Send {
    async fn attempt(&mut self, url: &NormalizedUrl, timeout: Duration) -> Result<String, RenderError>;
}

/// Runs `target.attempt` until it succeeds or the policy is exhausted.
///
/// The error of the last attempt is the one reported.
pub async fn render_with_retries<A>(
    target: &mut A,
    policy: RetryPolicy,
    url: &NormalizedUrl,
    timeout: Duration,
) -> PageResult
where
    A: RenderAttempt + ?Sized,
{
    let attempts = policy.attempts();
    let mut retry = 0;

    loop {
        match target.attempt(url, timeout).await {
            Ok(html) => return PageResult::Rendered { url: url.clone(), html },
            Err(error) if retry + 1 >= attempts => {
                debug!("Giving up on {} after {} attempts", url, attempts);
                return PageResult::Failed { url: url.clone(), error };
            }
            Err(error) => {
                retry += 1;
                let backoff = policy.backoff(retry);
                warn!(
                    "Render of {} failed ({}), retrying (attempt {}/{}) in {:?}",
                    url,
                    error,
                    retry + 1,
                    attempts,
                    backoff
                );
                sleep(backoff).await;
            }
        }
    }
}
