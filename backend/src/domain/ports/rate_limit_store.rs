//! Port for the shared rate-limit counter store.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures talking to the counter store.
    pub enum RateLimitStoreError {
        /// Store could not be reached or rejected the command.
        Unavailable { message: String } => "rate limit store unavailable: {message}",
        /// Store did not answer in time.
        Timeout { message: String } => "rate limit store timed out: {message}",
    }
}

/// Counter state after one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Hits recorded in the current window, including this one.
    pub count: u64,
    /// Seconds until the window resets.
    pub ttl_secs: u64,
}

/// Shared fixed-window counters.
///
/// Implementations increment the counter for `key` and start its expiry on
/// the first hit of a window as one atomic step, so concurrent requests from
/// the same client never race.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<WindowCount, RateLimitStoreError>;
}

/// Store that records nothing; every hit reports the first of its window.
///
/// Backs the limiter when enforcement is switched off and no Redis is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRateLimitStore;

#[async_trait]
impl RateLimitStore for DisabledRateLimitStore {
    async fn hit(&self, _key: &str, window_secs: u64) -> Result<WindowCount, RateLimitStoreError> {
        Ok(WindowCount {
            count: 1,
            ttl_secs: window_secs,
        })
    }
}
