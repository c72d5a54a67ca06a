use std::future::Future;

use anyhow::Result;
use tokio::time::{sleep, Duration};
use tracing::warn;

/// Fixed-backoff retry that never gives up.
///
/// The refresh flow prefers availability over fast-fail: an authorization
/// server outage must not terminate the daemon, so attempts continue until
/// one succeeds. There is no attempt cap and no exponential growth.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub backoff: Duration,
}

impl RetrySettings {
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// Runs `operation` until it succeeds, sleeping `backoff` between
    /// attempts. The attempt counter is handed to the operation for logging.
    pub async fn run_until_success<F, Fut, T>(&self, mut operation: F) -> T
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return value,
                Err(e) => {
                    warn!(
                        "attempt {attempt} failed: {e:#}; retrying in {}s",
                        self.backoff.as_secs()
                    );
                    sleep(self.backoff).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
