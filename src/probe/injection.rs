//! Injection probe: known SQL payloads against conventional parameters.

use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::error::ProbeError;

use super::classify::{Signal, classify_response};
use super::payloads::{INJECTION_PARAMS, SQL_PAYLOADS};
use super::scheduler::{RateScheduler, bounded, dispatch_batch, payload_slice};
use super::{ProbeEngine, ProbeResult, url_for};

impl ProbeEngine {
    /// Tries the first `intensity` SQL payloads, each against the `id`,
    /// `user`, and `search` query parameters, repeating passes until the
    /// duration expires.
    ///
    /// `attempts` counts payloads tried; `detected` and `vulnerable`
    /// count per matching response, so a payload reflected by several
    /// parameters increments more than once.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidTarget`] if the target cannot be
    /// parsed as a URL.
    pub(crate) async fn injection(
        &self,
        target: &str,
        intensity: u8,
        duration: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        let base = url_for(target)?;
        let limit = Duration::from_millis(self.config().request_timeout_ms);
        let delay = Duration::from_millis(self.config().attempt_delay_ms);
        let slice = payload_slice(SQL_PAYLOADS, intensity);

        let mut attempts: u64 = 0;
        let mut detected: u64 = 0;
        let mut vulnerable: u64 = 0;

        let sched = RateScheduler::new(duration);
        while !sched.expired() {
            let batch: Vec<_> = slice
                .iter()
                .map(|payload| self.try_payload(base.clone(), payload, INJECTION_PARAMS, limit))
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

            debug!(attempts, detected, vulnerable, "injection pass complete");
            sched.pace(delay).await;
        }

        Ok(ProbeResult::Injection {
            attempts,
            detected,
            vulnerable,
            elapsed_secs: sched.elapsed_secs(),
        })
    }

    /// Applies one payload to each parameter name in turn, classifying
    /// every response. Failed or timed-out requests yield no signal.
    pub(crate) async fn try_payload(
        &self,
        base: Url,
        payload: &str,
        params: &[&str],
        limit: Duration,
    ) -> Vec<Signal> {
        let mut signals = Vec::with_capacity(params.len());
        for param in params {
            let mut url = base.clone();
            url.query_pairs_mut().append_pair(param, payload);

            match bounded(limit, self.http().get(url).send()).await {
                Some(Ok(response)) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    signals.push(classify_response(status, &body, payload));
                }
                // Unreachable parameter: no signal either way
                _ => {}
            }
        }
        signals
    }
}
