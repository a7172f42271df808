//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use discovery_backend::domain::ports::DependencyCheck;
use discovery_backend::domain::RateLimitPolicy;
use discovery_backend::inbound::http::auth_config::AuthSettings;
use discovery_backend::outbound::persistence::DbPool;
use discovery_backend::outbound::rate_limit::RedisRateLimitStore;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) auth: AuthSettings,
    pub(crate) rate_limit_store: Option<RedisRateLimitStore>,
    pub(crate) rate_limit_policy: RateLimitPolicy,
}

impl ServerConfig {
    /// Construct a configuration with rate limiting switched off.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, db_pool: DbPool, auth: AuthSettings) -> Self {
        Self {
            bind_addr,
            db_pool,
            auth,
            rate_limit_store: None,
            rate_limit_policy: RateLimitPolicy {
                enabled: false,
                ..RateLimitPolicy::default()
            },
        }
    }

    /// Attach the shared counter store and the policy applied to it.
    #[must_use]
    pub fn with_rate_limit(
        mut self,
        store: Option<RedisRateLimitStore>,
        policy: RateLimitPolicy,
    ) -> Self {
        self.rate_limit_store = store;
        self.rate_limit_policy = policy;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Dependencies whose health gates readiness.
    #[must_use]
    pub fn dependency_checks(&self) -> Vec<Arc<dyn DependencyCheck>> {
        let mut checks: Vec<Arc<dyn DependencyCheck>> = vec![Arc::new(self.db_pool.clone())];
        if let Some(store) = &self.rate_limit_store {
            checks.push(Arc::new(store.clone()));
        }
        checks
    }
}
