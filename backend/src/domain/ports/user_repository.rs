//! Port abstraction for user persistence adapters.
use async_trait::async_trait;

use crate::domain::{Email, NewUser, UsageCounts, User, UserChanges, UserId};

use super::RepositoryError;

/// Storage for user accounts.
///
/// Email and username uniqueness is enforced by the adapter inside the
/// insert transaction and surfaces as [`RepositoryError::Conflict`] with
/// `field` set to `email` or `username`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account with tier `free`, role `member`, active.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Fetch a user by identifier.
    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user by normalised email.
    async fn get_by_natural_key(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Apply `changes` and return the refreshed record, or `None` when the
    /// user does not exist.
    async fn update(
        &self,
        id: &UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError>;

    /// Projects and molecules currently owned by `id`.
    async fn usage_counts(&self, id: &UserId) -> Result<UsageCounts, RepositoryError>;
}
