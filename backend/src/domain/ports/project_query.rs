//! Driving port for project reads.

use async_trait::async_trait;

use crate::domain::{Actor, Error, Project, ProjectFilter, ProjectId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectQuery: Send + Sync {
    /// Fetch one project the actor owns.
    async fn get(&self, actor: &Actor, id: &ProjectId) -> Result<Project, Error>;

    /// The actor's own projects.
    async fn list(&self, actor: &Actor, filter: ProjectFilter) -> Result<Vec<Project>, Error>;
}
