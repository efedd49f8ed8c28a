//! Request throttling
//!
//! A drain issues its page requests back to back; the limiter spaces them
//! to the configured rate using a governor token bucket.

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

/// Requests per second and burst allowance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    pub requests_per_second: u32,
    /// Zero means "same as the rate"
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

impl RateLimiterConfig {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Governor quota, or `None` when the rate is zero
    pub fn quota(&self) -> Option<Quota> {
        let rate = NonZeroU32::new(self.requests_per_second)?;
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(rate);
        Some(Quota::per_second(rate).allow_burst(burst))
    }
}

/// Token bucket shared by clones of one client
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DefaultDirectRateLimiter>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Build a limiter; a zero rate disables limiting
    pub fn from_config(config: &RateLimiterConfig) -> Option<Self> {
        let quota = config.quota()?;
        Some(Self {
            bucket: Arc::new(governor::RateLimiter::direct(quota)),
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Take a permit, waiting for the bucket to refill if it is empty
    pub async fn wait(&self) {
        if self.bucket.check().is_ok() {
            return;
        }
        debug!(
            "Rate limit of {}/s reached, waiting for a permit",
            self.config.requests_per_second
        );
        self.bucket.until_ready().await;
    }

    /// Take a permit only if one is available now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
