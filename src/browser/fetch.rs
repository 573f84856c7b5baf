use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::Retry;
use tracing::{debug, error, warn};

use super::Page;
use crate::config::{FetchConfig, SiteConfig};

/// Pacing, timeout and retry ceiling for one site's navigations.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    pub delay_min: Duration,
    pub delay_max: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl FetchPolicy {
    pub fn new(site: &SiteConfig, fetch: &FetchConfig) -> Self {
        Self {
            delay_min: Duration::from_secs_f64(site.delay_min_secs.max(0.0)),
            delay_max: Duration::from_secs_f64(site.delay_max_secs.max(0.0)),
            timeout: fetch.timeout(),
            max_retries: fetch.max_retries.max(1),
            backoff_step: Duration::from_secs(fetch.backoff_step_secs),
        }
    }

    /// Uniform draw from `[delay_min, delay_max]`.
    pub fn human_delay(&self) -> Duration {
        if self.delay_max <= self.delay_min {
            return self.delay_min;
        }
        let secs = rand::thread_rng()
            .gen_range(self.delay_min.as_secs_f64()..=self.delay_max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Waits between attempts: `backoff_step × n` after the n-th failure.
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        let step = self.backoff_step;
        (1..self.max_retries).map(move |n| step * n)
    }
}

/// Navigates to `url`, retrying transient failures. Returns `true` once a
/// 2xx response is seen and `false` when every attempt failed; it never
/// returns an error for network trouble.
pub async fn fetch_with_retry(page: &dyn Page, url: &str, policy: &FetchPolicy) -> bool {
    let attempt = AtomicU32::new(0);

    let result = Retry::spawn(policy.backoff(), || {
        let n = attempt.fetch_add(1, Ordering::Relaxed) + 1;
        async move {
            let delay = policy.human_delay();
            debug!(url, attempt = n, delay_ms = delay.as_millis() as u64, "Pacing before navigation");
            tokio::time::sleep(delay).await;

            match page.goto(url, policy.timeout).await {
                Ok(Some(status)) if (200..300).contains(&status) => Ok(status),
                Ok(Some(status)) => {
                    warn!(url, attempt = n, status, "Fetch attempt got non-success status");
                    metrics::counter!("fetch_attempt_failures").increment(1);
                    Err(())
                }
                Ok(None) => {
                    warn!(url, attempt = n, "Fetch attempt got no response");
                    metrics::counter!("fetch_attempt_failures").increment(1);
                    Err(())
                }
                Err(e) => {
                    warn!(url, attempt = n, error = %e, "Fetch attempt failed");
                    metrics::counter!("fetch_attempt_failures").increment(1);
                    Err(())
                }
            }
        }
    })
    .await;

    match result {
        Ok(_) => true,
        Err(()) => {
            error!(url, attempts = policy.max_retries, "Fetch failed after all retries");
            false
        }
    }
}
