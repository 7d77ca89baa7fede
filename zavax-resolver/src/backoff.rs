//! Delay policies between resolver attempts.
//!
//! Block production is asynchronous to the caller, so the resolver waits
//! between polls. The wait is a policy object so tests can shrink it.

use std::fmt;
use std::time::Duration;

/// Default delay between resolver attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Jitter percentage for [`JitteredBackoff`] (±10%).
pub const JITTER_PERCENT: f64 = 0.1;

/// Decides how long to wait after a completed attempt.
pub trait BackoffPolicy: Send + Sync + fmt::Debug {
    /// Delay before the attempt following `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay after every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    delay: Duration,
}

impl ConstantBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for ConstantBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_RETRY_DELAY_MS))
    }
}

impl BackoffPolicy for ConstantBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// No delay at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoBackoff;

impl BackoffPolicy for NoBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Constant base delay with random jitter.
///
/// Spreads polls from many concurrent resolvers hitting the same node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitteredBackoff {
    base: Duration,
    jitter: f64,
}

impl JitteredBackoff {
    /// `jitter` is a fraction of `base`, clamped to `0.0..=1.0`.
    pub fn new(base: Duration, jitter: f64) -> Self {
        Self {
            base,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }
}

impl Default for JitteredBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_RETRY_DELAY_MS), JITTER_PERCENT)
    }
}

impl BackoffPolicy for JitteredBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        let jitter = rand::random::<f64>() * self.jitter * 2.0 - self.jitter;
        let millis = (self.base.as_millis() as f64 * (1.0 + jitter)).max(0.0);
        Duration::from_millis(millis as u64)
    }
}
