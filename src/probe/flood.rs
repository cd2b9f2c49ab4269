//! Flood probe: concurrent idempotent read requests for a fixed duration.

use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::error::ProbeError;

use super::scheduler::{RateScheduler, bounded, dispatch_batch, flood_batch_size};
use super::{ProbeEngine, ProbeResult, url_for};

impl ProbeEngine {
    /// Issues `intensity * 10` concurrent GET requests per tick until the
    /// wall-clock duration expires, pacing to roughly one tick per second.
    ///
    /// Every outcome is classified: success when the response status is
    /// not a server error, failure otherwise — transport failures and
    /// timeouts included, never propagated.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidTarget`] if the target cannot be
    /// parsed as a URL.
    pub(crate) async fn flood(
        &self,
        target: &str,
        intensity: u8,
        duration: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        let url = url_for(target)?;
        let limit = Duration::from_millis(self.config().flood_timeout_ms);
        let tick = Duration::from_millis(self.config().flood_tick_ms);
        let batch_size = flood_batch_size(intensity);

        let mut requests_sent: u64 = 0;
        let mut successful: u64 = 0;
        let mut failed: u64 = 0;

        let sched = RateScheduler::new(duration);
        while !sched.expired() {
            let batch: Vec<_> = (0..batch_size)
                .map(|_| self.flood_request(url.clone(), limit))
                .collect();

            for ok in dispatch_batch(batch).await {
                requests_sent += 1;
                if ok {
                    successful += 1;
                } else {
                    failed += 1;
                }
            }

            debug!(requests_sent, successful, failed, "flood tick complete");
            sched.pace(tick).await;
        }

        let elapsed_secs = sched.elapsed_secs();
        #[allow(clippy::cast_precision_loss)]
        let average_rps = if elapsed_secs > 0.0 {
            requests_sent as f64 / elapsed_secs
        } else {
            0.0
        };

        Ok(ProbeResult::Flood {
            requests_sent,
            successful,
            failed,
            elapsed_secs,
            average_rps,
        })
    }

    /// One bounded GET. True when a response arrived with a status below
    /// the server-error range.
    async fn flood_request(&self, url: Url, limit: Duration) -> bool {
        match bounded(limit, self.http().get(url).send()).await {
            Some(Ok(response)) => !response.status().is_server_error(),
            // Timeout or transport failure counts as a failed request
            _ => false,
        }
    }
}
