//! Driving port for account mutations: registration, login, and profile or
//! administrative edits.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{Actor, Error, LoginCredentials, LoginSuccess, Registration, SecureUser, UserId};

/// Account use-cases invoked by inbound adapters.
///
/// Update methods take the raw JSON object from the request body; the
/// implementation checks its keys against the role whitelist before parsing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create a `free`, `member`, active account.
    async fn register(&self, registration: Registration) -> Result<SecureUser, Error>;

    /// Verify credentials and issue a session token.
    async fn login(&self, credentials: LoginCredentials) -> Result<LoginSuccess, Error>;

    /// Self-service edit of the actor's own display fields.
    async fn update_profile(
        &self,
        actor: &Actor,
        fields: Map<String, Value>,
    ) -> Result<SecureUser, Error>;

    /// Administrative edit of any account.
    async fn update_user(
        &self,
        actor: &Actor,
        user_id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<SecureUser, Error>;

    /// Administrative tier assignment.
    async fn change_tier(
        &self,
        actor: &Actor,
        user_id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<SecureUser, Error>;
}
