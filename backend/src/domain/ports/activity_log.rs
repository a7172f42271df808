//! Port abstraction for the audit trail.
use async_trait::async_trait;

use crate::domain::{ActivityLogEntry, NewActivity, UserId};

use super::RepositoryError;

/// Append-only audit storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, entry: &NewActivity) -> Result<ActivityLogEntry, RepositoryError>;

    /// Most recent entries for `user`, newest first.
    async fn list_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<ActivityLogEntry>, RepositoryError>;
}
