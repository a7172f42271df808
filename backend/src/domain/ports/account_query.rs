//! Driving port for identity resolution and account reads.

use async_trait::async_trait;

use crate::domain::{Actor, Error, SecureUser, UserId, UserUsage};

/// Identity use-cases invoked by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// Verify a bearer token and load the actor's role and tier from
    /// storage. Unknown or deactivated accounts are rejected.
    async fn resolve_actor(&self, token: &str) -> Result<Actor, Error>;

    /// Subject of a token whose signature and expiry verify, without a
    /// storage round-trip. Used to key rate-limit counters.
    fn token_subject(&self, token: &str) -> Option<UserId>;

    /// The actor's own account.
    async fn current_user(&self, actor: &Actor) -> Result<SecureUser, Error>;

    /// Tier, activity status, and owned-resource totals for the actor's
    /// own account.
    async fn usage(&self, actor: &Actor) -> Result<UserUsage, Error>;
}
