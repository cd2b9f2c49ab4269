//! Wall-clock scheduling and batch dispatch for probe runs.
//!
//! A [`RateScheduler`] bounds a run strictly by elapsed time: a slow
//! target reduces achieved throughput but never extends the run beyond
//! its duration plus the in-flight batch's completion. Batch dispatch
//! collects every outcome independently so one hung operation cannot
//! block or fail its peers.

use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::Instant;

/// Tracks elapsed wall-clock time against a fixed run duration.
#[derive(Debug)]
pub struct RateScheduler {
    started: Instant,
    duration: Duration,
}

impl RateScheduler {
    /// Starts the clock for a run of the given duration.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            started: Instant::now(),
            duration,
        }
    }

    /// Whether the run's wall-clock budget is spent.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.duration
    }

    /// Time elapsed since the run started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time in fractional seconds, for throughput reporting.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Sleeps between ticks, never past the run's deadline: the next
    /// batch starts one delay after the previous batch fully completed,
    /// or expiry is observed immediately, whichever comes first.
    pub async fn pace(&self, delay: Duration) {
        let remaining = self.duration.saturating_sub(self.started.elapsed());
        tokio::time::sleep(delay.min(remaining)).await;
    }
}

// ============================================================================
// Batch sizing
// ============================================================================

/// Concurrent operations per flood tick: `intensity * 10`.
#[must_use]
pub fn flood_batch_size(intensity: u8) -> usize {
    usize::from(intensity) * 10
}

/// Prefix of a payload list selected by intensity: `min(len, intensity)`.
#[must_use]
pub fn payload_slice<'a>(payloads: &'a [&'a str], intensity: u8) -> &'a [&'a str] {
    &payloads[..payloads.len().min(usize::from(intensity))]
}

/// Prefix of the credential list: `min(len, intensity * 2)`.
#[must_use]
pub fn credential_slice<'a>(credentials: &'a [&'a str], intensity: u8) -> &'a [&'a str] {
    &credentials[..credentials.len().min(usize::from(intensity) * 2)]
}

// ============================================================================
// Batch dispatch
// ============================================================================

/// Dispatches a batch of operations concurrently and collects every
/// outcome. Operations are expected to be infallible at the future level
/// (failures folded into their output), so the batch always returns one
/// outcome per operation.
pub async fn dispatch_batch<T, F>(ops: Vec<F>) -> Vec<T>
where
    F: Future<Output = T>,
{
    join_all(ops).await
}

/// Bounds a single operation by a timeout, yielding `None` on expiry.
pub async fn bounded<T, F>(limit: Duration, op: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, op).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_batch_scales_with_intensity() {
        for intensity in 1..=10u8 {
            assert_eq!(flood_batch_size(intensity), usize::from(intensity) * 10);
        }
    }

    #[test]
    fn payload_slice_bounded_by_intensity() {
        let payloads = ["a", "b", "c", "d"];
        assert_eq!(payload_slice(&payloads, 1), &["a"]);
        assert_eq!(payload_slice(&payloads, 3), &["a", "b", "c"]);
        // Intensity beyond list length saturates
        assert_eq!(payload_slice(&payloads, 10).len(), 4);
    }

    #[test]
    fn credential_slice_is_double_intensity() {
        let creds: Vec<&str> = (0..20).map(|_| "pw").collect();
        assert_eq!(credential_slice(&creds, 1).len(), 2);
        assert_eq!(credential_slice(&creds, 5).len(), 10);
        assert_eq!(credential_slice(&creds, 10).len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_expires_on_wall_clock() {
        let sched = RateScheduler::new(Duration::from_secs(2));
        assert!(!sched.expired());

        tokio::time::advance(Duration::from_millis(1_999)).await;
        assert!(!sched.expired());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(sched.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn pace_never_sleeps_past_the_deadline() {
        let sched = RateScheduler::new(Duration::from_secs(2));
        tokio::time::advance(Duration::from_millis(1_500)).await;

        // A delay far beyond the remaining budget is capped at expiry
        sched.pace(Duration::from_secs(60)).await;
        assert!(sched.expired());
        assert!(sched.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn batch_collects_all_outcomes_independently() {
        // One op is far slower than the rest; bounded() caps it without
        // affecting its peers.
        let ops: Vec<std::pin::Pin<Box<dyn Future<Output = Option<u32>>>>> = vec![
            Box::pin(bounded(Duration::from_secs(1), async { 1u32 })),
            Box::pin(bounded(Duration::from_secs(1), async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                2u32
            })),
            Box::pin(bounded(Duration::from_secs(1), async { 3u32 })),
        ];

        let outcomes = dispatch_batch(ops).await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], Some(1));
        assert_eq!(outcomes[1], None); // timed out
        assert_eq!(outcomes[2], Some(3));
    }
}
