//! Driving port for project mutations.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{Actor, Error, Project, ProjectDraft, ProjectId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectCommand: Send + Sync {
    /// Create a project owned by `actor`.
    async fn create(&self, actor: &Actor, draft: ProjectDraft) -> Result<Project, Error>;

    /// Apply a whitelisted update to an owned project.
    async fn update(
        &self,
        actor: &Actor,
        id: &ProjectId,
        fields: Map<String, Value>,
    ) -> Result<Project, Error>;

    /// Delete an owned project with its molecules and predictions.
    async fn delete(&self, actor: &Actor, id: &ProjectId) -> Result<(), Error>;
}
