use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, Instant};
use tracing::{error, info};

use crate::exchange::client::ExchangeClient;
use crate::exchange::transport::TokenTransport;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Drives refresh cycles: once at startup, then on a fixed interval.
///
/// One sequential flow. A cycle in progress (retry loop included) blocks the
/// poll loop, so exchanges never overlap and the store has exactly one
/// writer. Due-ness is checked about once per second; jitter up to the poll
/// interval is fine for a 16-hour schedule.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn run<T: TokenTransport>(&self, client: &ExchangeClient<T>) -> Result<()> {
        // The previous token may have expired while the process was down:
        // fetch before arming the schedule.
        self.run_cycle(client).await;
        info!(
            "scheduler running, next refresh in {}s",
            self.interval.as_secs()
        );

        let mut next_due = Instant::now() + self.interval;
        loop {
            if Instant::now() >= next_due {
                self.run_cycle(client).await;
                next_due = Instant::now() + self.interval;
                info!(
                    "next refresh in {}s",
                    self.interval.as_secs()
                );
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn run_cycle<T: TokenTransport>(&self, client: &ExchangeClient<T>) {
        // The exchange retries internally, so an error here means
        // persistence failed. The last-good file keeps being served and the
        // next scheduled cycle tries again.
        if let Err(err) = client.refresh_cycle().await {
            error!("refresh cycle failed: {err:#}");
        }
    }
}
