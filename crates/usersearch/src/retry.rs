//! Retry configuration, backoff computation and request cancellation.
//!
//! The exponential schedule comes from `backon`; jitter and rate-limit reset
//! hints are layered on top by [`RetryConfig::next_delay`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use rand::Rng;
use tokio::sync::Notify;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Delay before the first retry; doubled for each subsequent one.
    pub base_delay: Duration,
    /// Upper bound for a single backoff delay, before jitter.
    pub max_delay: Duration,
    /// Retries after the first attempt. Total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Whether to add jitter to exponential delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Unjittered delays for each retry: `min(base * 2^n, max)`, yielding
    /// exactly `max_retries` values.
    #[must_use]
    pub fn schedule(&self) -> ExponentialBackoff {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(self.max_retries as usize)
            .build()
    }

    /// Pick the delay for one retry.
    ///
    /// A reset hint wins when it is positive and shorter than `max_delay`.
    /// Otherwise the scheduled delay is used, jittered if enabled.
    #[must_use]
    pub fn next_delay(&self, scheduled: Duration, reset_hint: Option<Duration>) -> Duration {
        if let Some(hint) = reset_hint
            && !hint.is_zero()
            && hint < self.max_delay
        {
            return hint;
        }

        let scheduled = scheduled.min(self.max_delay);
        if self.with_jitter {
            apply_jitter(scheduled, rand::rng().random::<f64>())
        } else {
            scheduled
        }
    }
}

/// Add `delay * 0.2 * (sample - 0.5)` and floor to whole milliseconds.
///
/// `sample` is expected in `[0, 1)`, which keeps the result within ±10% of
/// `delay`.
#[must_use]
pub fn apply_jitter(delay: Duration, sample: f64) -> Duration {
    let ms = delay.as_millis() as f64;
    let jitter = ms * 0.2 * (sample - 0.5);
    Duration::from_millis((ms + jitter).floor().max(0.0) as u64)
}

/// Time until a rate-limit window resets, from the `X-RateLimit-Reset` epoch
/// seconds and the current time in epoch milliseconds. `None` if already past.
#[must_use]
pub fn reset_wait(reset_epoch_secs: i64, now_ms: i64) -> Option<Duration> {
    let wait = reset_epoch_secs.saturating_mul(1000).saturating_sub(now_ms);
    (wait > 0).then(|| Duration::from_millis(wait as u64))
}

/// Cooperative cancellation shared between a caller and in-flight requests.
///
/// Clones observe the same state. Once cancelled, a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
