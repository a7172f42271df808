//! Redis-backed fixed-window counters for the rate limiter.
//!
//! Every instance of the service talks to the same Redis, so quotas hold
//! across horizontally scaled deployments. Counters live under namespaced
//! keys built by the domain (`rl:<scope>:<window>s:<client>`) and expire with
//! their window.
//!
//! A single Lua script increments the counter, arms the expiry on first use,
//! and reports the remaining TTL, so concurrent callers never observe a
//! counter without an expiry.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::{self, Script};
use tracing::debug;

use crate::domain::ports::{
    DependencyCheck, DependencyError, RateLimitStore, RateLimitStoreError, WindowCount,
};

const HIT_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
  ttl = tonumber(ARGV[1])
end
return {count, ttl}
";

/// Connection settings for the Redis counter store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl RedisStoreConfig {
    /// Defaults: 8 connections, 2 second checkout timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: 8,
            connection_timeout: Duration::from_secs(2),
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the connection checkout timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Rate-limit counter store backed by a `bb8-redis` pool.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: Pool<RedisConnectionManager>,
    script: Script,
}

impl RedisRateLimitStore {
    /// Build the pool. Connections are established lazily, so an unreachable
    /// Redis surfaces on the first hit rather than at startup.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitStoreError::Unavailable`] when the URL is invalid.
    pub fn connect(config: &RedisStoreConfig) -> Result<Self, RateLimitStoreError> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|err| RateLimitStoreError::unavailable(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build_unchecked(manager);
        Ok(Self {
            pool,
            script: Script::new(HIT_SCRIPT),
        })
    }

    /// Round-trip a `PING`; used by readiness checks.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitStoreError::Unavailable`] when Redis cannot be
    /// reached.
    pub async fn ping(&self) -> Result<(), RateLimitStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| RateLimitStoreError::unavailable(err.to_string()))?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map(|_| ())
            .map_err(|err| RateLimitStoreError::unavailable(err.to_string()))
    }
}

#[async_trait]
impl DependencyCheck for RedisRateLimitStore {
    fn name(&self) -> &'static str {
        "rate_limit_store"
    }

    async fn check(&self) -> Result<(), DependencyError> {
        self.ping()
            .await
            .map_err(|err| DependencyError::unhealthy(err.to_string()))
    }
}

/// Interpret the script reply. Redis integers are signed; negative values
/// never come back from the script but are clamped rather than trusted.
fn window_count(count: i64, ttl: i64, window_secs: u64) -> WindowCount {
    WindowCount {
        count: u64::try_from(count).unwrap_or(0),
        ttl_secs: u64::try_from(ttl).unwrap_or(window_secs),
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &str, window_secs: u64) -> Result<WindowCount, RateLimitStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| RateLimitStoreError::unavailable(err.to_string()))?;
        let (count, ttl): (i64, i64) = self
            .script
            .key(key)
            .arg(window_secs)
            .invoke_async(&mut *conn)
            .await
            .map_err(|err| RateLimitStoreError::unavailable(err.to_string()))?;
        debug!(%key, count, ttl, "rate limit counter advanced");
        Ok(window_count(count, ttl, window_secs))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3, 42, 60, WindowCount { count: 3, ttl_secs: 42 })]
    #[case(1, -1, 60, WindowCount { count: 1, ttl_secs: 60 })]
    #[case(-5, 10, 60, WindowCount { count: 0, ttl_secs: 10 })]
    fn script_replies_are_clamped(
        #[case] count: i64,
        #[case] ttl: i64,
        #[case] window: u64,
        #[case] expected: WindowCount,
    ) {
        assert_eq!(window_count(count, ttl, window), expected);
    }

    #[rstest]
    fn invalid_urls_are_rejected() {
        let result = RedisRateLimitStore::connect(&RedisStoreConfig::new("not a url"));
        assert!(matches!(result, Err(RateLimitStoreError::Unavailable { .. })));
    }

    #[rstest]
    fn config_builder_overrides_defaults() {
        let config = RedisStoreConfig::new("redis://localhost:6379")
            .with_max_size(2)
            .with_connection_timeout(Duration::from_millis(100));
        assert_eq!(config.max_size, 2);
        assert_eq!(config.connection_timeout, Duration::from_millis(100));
    }
}
