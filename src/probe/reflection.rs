//! Reflection probe: markup/script payloads against conventional parameters.
//!
//! Structurally the injection probe with a different payload table and
//! parameter set; a response is vulnerable when it reflects the payload
//! string verbatim.

use std::time::Duration;

use tracing::debug;

use crate::error::ProbeError;

use super::classify::Signal;
use super::payloads::{REFLECTION_PARAMS, REFLECTION_PAYLOADS};
use super::scheduler::{RateScheduler, dispatch_batch, payload_slice};
use super::{ProbeEngine, ProbeResult, url_for};

impl ProbeEngine {
    /// Tries the first `intensity` markup payloads, each against the
    /// `q`, `search`, and `input` query parameters, repeating passes
    /// until the duration expires.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidTarget`] if the target cannot be
    /// parsed as a URL.
    pub(crate) async fn reflection(
        &self,
        target: &str,
        intensity: u8,
        duration: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        let base = url_for(target)?;
        let limit = Duration::from_millis(self.config().request_timeout_ms);
        let delay = Duration::from_millis(self.config().attempt_delay_ms);
        let slice = payload_slice(REFLECTION_PAYLOADS, intensity);

        let mut attempts: u64 = 0;
        let mut detected: u64 = 0;
        let mut vulnerable: u64 = 0;

        let sched = RateScheduler::new(duration);
        while !sched.expired() {
            let batch: Vec<_> = slice
                .iter()
                .map(|payload| self.try_payload(base.clone(), payload, REFLECTION_PARAMS, limit))
                .collect();

            for signals in dispatch_batch(batch).await {
                attempts += 1;
                for signal in signals {
                    match signal {
                        Signal::Vulnerable => {
                            vulnerable += 1;
                            detected += 1;
                        }
                        Signal::Detected => detected += 1,
                        Signal::Neutral => {}
                    }
                }
            }

            debug!(attempts, detected, vulnerable, "reflection pass complete");
            sched.pace(delay).await;
        }

        Ok(ProbeResult::Reflection {
            attempts,
            detected,
            vulnerable,
            elapsed_secs: sched.elapsed_secs(),
        })
    }
}
