//! Pacing between upstream calls.
//!
//! The streaming planner pauses between locators to stay under upstream
//! rate limits. The policy is a named abstraction so a fixed delay can later
//! become adaptive without touching orchestration logic.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Backpressure policy applied between paced operations.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next operation may proceed.
    async fn pause(&self);
}

/// Fixed-delay pacer: sleeps for a constant duration.
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    /// Create a pacer with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelayPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Quota-based pacer backed by the governor crate.
///
/// Smooths bursts instead of sleeping a fixed amount after every item.
pub struct ThrottledPacer {
    limiter: Arc<DirectRateLimiter>,
}

impl ThrottledPacer {
    /// Allow `per_minute` operations per minute.
    pub fn per_minute(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(nonzero!(30u32)));
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create with a custom quota.
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

#[async_trait]
impl Pacer for ThrottledPacer {
    async fn pause(&self) {
        self.limiter.until_ready().await;
    }
}

/// No-op pacer for tests.
#[derive(Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}
