//! Driving port for reading the audit trail.

use async_trait::async_trait;

use crate::domain::{ActivityLogEntry, Actor, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityQuery: Send + Sync {
    /// The actor's own recent activity, newest first.
    async fn recent(&self, actor: &Actor, limit: u32) -> Result<Vec<ActivityLogEntry>, Error>;
}
