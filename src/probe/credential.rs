//! Credential-guess probe: common passwords as simulated login attempts.

use std::time::Duration;

use reqwest::Url;
use serde_json::json;
use tracing::debug;

use crate::error::ProbeError;

use super::payloads::{COMMON_PASSWORDS, CREDENTIAL_USERNAME};
use super::scheduler::{RateScheduler, bounded, credential_slice, dispatch_batch};
use super::{ProbeEngine, ProbeResult, url_for};

impl ProbeEngine {
    /// Submits the first `intensity * 2` common passwords as JSON login
    /// attempts, repeating passes until the duration expires.
    ///
    /// `blocked` counts responses that indicate active throttling (429
    /// rate-limit or 403 forbidden). Redirects are not followed: a
    /// redirect on login is a response in its own right, not a page to
    /// chase.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidTarget`] if the target cannot be
    /// parsed as a URL.
    pub(crate) async fn credential_guess(
        &self,
        target: &str,
        intensity: u8,
        duration: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        let url = url_for(target)?;
        let limit = Duration::from_millis(self.config().credential_timeout_ms);
        let delay = Duration::from_millis(self.config().credential_delay_ms);
        let slice = credential_slice(COMMON_PASSWORDS, intensity);

        let mut attempts: u64 = 0;
        let mut blocked: u64 = 0;

        let sched = RateScheduler::new(duration);
        while !sched.expired() {
            let batch: Vec<_> = slice
                .iter()
                .map(|password| self.login_attempt(url.clone(), password, limit))
                .collect();

            for status in dispatch_batch(batch).await {
                attempts += 1;
                if matches!(status, Some(429 | 403)) {
                    blocked += 1;
                }
            }

            debug!(attempts, blocked, "credential pass complete");
            sched.pace(delay).await;
        }

        Ok(ProbeResult::CredentialGuess {
            attempts,
            blocked,
            elapsed_secs: sched.elapsed_secs(),
        })
    }

    /// One bounded login POST. Returns the response status, or `None`
    /// when the attempt failed at the transport level or timed out.
    async fn login_attempt(&self, url: Url, password: &str, limit: Duration) -> Option<u16> {
        let body = json!({
            "username": CREDENTIAL_USERNAME,
            "password": password,
        });

        match bounded(limit, self.http_no_redirect().post(url).json(&body).send()).await {
            Some(Ok(response)) => Some(response.status().as_u16()),
            _ => None,
        }
    }
}
