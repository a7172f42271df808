//! Port abstraction for project persistence adapters.
use async_trait::async_trait;

use crate::domain::{NewProject, Project, ProjectChanges, ProjectFilter, ProjectId, UserId};

use super::RepositoryError;

/// Storage for research projects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &NewProject) -> Result<Project, RepositoryError>;

    async fn get_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError>;

    /// Projects owned by `owner`, newest first.
    async fn search(
        &self,
        owner: &UserId,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, RepositoryError>;

    /// Apply `changes` and return the refreshed record, or `None` when the
    /// project does not exist.
    async fn update(
        &self,
        id: &ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, RepositoryError>;

    /// Delete a project and, by cascade, its molecules and predictions.
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: &ProjectId) -> Result<bool, RepositoryError>;
}
