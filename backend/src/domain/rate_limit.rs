//! Fixed-window rate limiting over a shared counter store.
//!
//! Each endpoint belongs to a [`RateClass`] with one or more windows. Every
//! authenticated request is additionally charged against the caller's
//! tier quota. Counters live behind the [`RateLimitStore`] port so that all
//! service instances share them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::ports::{RateLimitStore, RateLimitStoreError};
use super::{Actor, Error, Tier, UserId};

/// Message returned when counters cannot be consulted and the limiter fails
/// closed.
pub const LIMITER_UNAVAILABLE: &str = "rate limiter unavailable";

const MINUTE: u64 = 60;
const HOUR: u64 = 3600;

/// A single fixed window: at most `limit` hits per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub limit: u64,
    pub window_secs: u64,
}

impl RateWindow {
    const fn new(limit: u64, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }
}

/// Policy class assigned to each endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateClass {
    Login,
    Register,
    Read,
    Search,
    Create,
    Update,
    Delete,
    BulkCreate,
}

impl RateClass {
    /// Counter namespace for the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Read => "read",
            Self::Search => "search",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::BulkCreate => "bulk_create",
        }
    }

    /// Whether a verified token subject may stand in for the peer address.
    ///
    /// Login and registration always count per peer, so a token never opens
    /// a fresh bucket on the unauthenticated routes.
    #[must_use]
    pub const fn counts_per_subject(self) -> bool {
        !matches!(self, Self::Login | Self::Register)
    }

    /// Windows a request in this class is charged against.
    #[must_use]
    pub const fn windows(self) -> &'static [RateWindow] {
        const LOGIN: [RateWindow; 1] = [RateWindow::new(5, MINUTE)];
        const REGISTER: [RateWindow; 1] = [RateWindow::new(3, HOUR)];
        const READ: [RateWindow; 1] = [RateWindow::new(100, MINUTE)];
        const SEARCH: [RateWindow; 1] = [RateWindow::new(20, MINUTE)];
        const CREATE: [RateWindow; 2] = [RateWindow::new(30, MINUTE), RateWindow::new(1000, HOUR)];
        const UPDATE: [RateWindow; 1] = [RateWindow::new(50, MINUTE)];
        const DELETE: [RateWindow; 1] = [RateWindow::new(10, MINUTE)];
        const BULK_CREATE: [RateWindow; 1] = [RateWindow::new(5, MINUTE)];
        match self {
            Self::Login => &LOGIN,
            Self::Register => &REGISTER,
            Self::Read => &READ,
            Self::Search => &SEARCH,
            Self::Create => &CREATE,
            Self::Update => &UPDATE,
            Self::Delete => &DELETE,
            Self::BulkCreate => &BULK_CREATE,
        }
    }
}

impl fmt::Display for RateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// General hourly quota for an authenticated caller.
#[must_use]
pub const fn tier_window(tier: Tier) -> RateWindow {
    match tier {
        Tier::Free => RateWindow::new(50, HOUR),
        Tier::Pro => RateWindow::new(500, HOUR),
        Tier::Enterprise => RateWindow::new(5000, HOUR),
    }
}

/// Identity a counter is kept for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Counter identity for a verified token subject.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self(format!("user:{user_id}"))
    }

    /// Counter identity for an unauthenticated peer address.
    #[must_use]
    pub fn for_peer(addr: &str) -> Self {
        Self(format!("ip:{addr}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runtime knobs for the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// When false every request is admitted without touching the store.
    pub enabled: bool,
    /// Admit requests when the store is unreachable instead of failing with
    /// 503.
    pub fail_open: bool,
    /// Upper bound on a single store round-trip.
    pub store_timeout: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_open: false,
            store_timeout: Duration::from_millis(250),
        }
    }
}

/// Admission decisions for endpoint classes and tier quotas.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Charge one request in `class` to `client`.
    pub async fn admit_class(&self, class: RateClass, client: &ClientKey) -> Result<(), Error> {
        for window in class.windows() {
            self.admit_window(class.as_str(), *window, client).await?;
        }
        Ok(())
    }

    /// Charge one request to the actor's hourly tier quota.
    pub async fn admit_tier(&self, actor: &Actor) -> Result<(), Error> {
        let client = ClientKey::for_user(actor.user_id);
        self.admit_window("tier", tier_window(actor.tier), &client)
            .await
    }

    async fn admit_window(
        &self,
        scope: &str,
        window: RateWindow,
        client: &ClientKey,
    ) -> Result<(), Error> {
        if !self.policy.enabled {
            return Ok(());
        }
        let key = format!("rl:{scope}:{}s:{client}", window.window_secs);
        let outcome = tokio::time::timeout(
            self.policy.store_timeout,
            self.store.hit(&key, window.window_secs),
        )
        .await;

        let count = match outcome {
            Ok(Ok(count)) => count,
            Ok(Err(err)) => return self.store_failure(&key, &err),
            Err(_) => {
                return self.store_failure(&key, &RateLimitStoreError::timeout("store call timed out"));
            }
        };

        if count.count > window.limit {
            let retry_after = count.ttl_secs.max(1);
            debug!(%key, count = count.count, limit = window.limit, retry_after, "rate limit exceeded");
            return Err(Error::rate_limited(retry_after));
        }
        Ok(())
    }

    fn store_failure(&self, key: &str, err: &RateLimitStoreError) -> Result<(), Error> {
        if self.policy.fail_open {
            warn!(%key, error = %err, "rate limit store unavailable; admitting request");
            Ok(())
        } else {
            error!(%key, error = %err, "rate limit store unavailable; rejecting request");
            Err(Error::service_unavailable(LIMITER_UNAVAILABLE))
        }
    }
}
