//! Project domain service.
//!
//! Every read of a single project goes through [`check_ownership`] before the
//! record leaves the service; listings are scoped to the actor in the query.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::authorization::{Whitelisted, apply_whitelisted_update, check_ownership};
use crate::domain::ports::{ActivityLog, ProjectCommand, ProjectQuery, ProjectRepository};
use crate::domain::service_support::{map_repository_error, record_activity};
use crate::domain::{
    ActivityAction, ActivityTarget, Actor, Error, NewActivity, Project, ProjectChanges,
    ProjectDraft, ProjectFilter, ProjectId,
};

pub(crate) const PROJECT_NOT_FOUND: &str = "project not found";

/// Project service implementing [`ProjectCommand`] and [`ProjectQuery`].
#[derive(Clone)]
pub struct ProjectService<P, A> {
    projects: Arc<P>,
    activity: Arc<A>,
}

impl<P, A> ProjectService<P, A> {
    pub fn new(projects: Arc<P>, activity: Arc<A>) -> Self {
        Self { projects, activity }
    }
}

impl<P, A> ProjectService<P, A>
where
    P: ProjectRepository,
    A: ActivityLog,
{
    async fn load_owned(&self, actor: &Actor, id: &ProjectId) -> Result<Project, Error> {
        let project = self
            .projects
            .get_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(PROJECT_NOT_FOUND))?;
        check_ownership(&project, actor)?;
        Ok(project)
    }
}

#[async_trait]
impl<P, A> ProjectCommand for ProjectService<P, A>
where
    P: ProjectRepository,
    A: ActivityLog,
{
    async fn create(&self, actor: &Actor, draft: ProjectDraft) -> Result<Project, Error> {
        let project = self
            .projects
            .create(&draft.owned_by(actor.user_id))
            .await
            .map_err(map_repository_error)?;
        info!(project = %project.id, user = %actor.user_id, "project created");
        record_activity(
            self.activity.as_ref(),
            NewActivity::new(
                actor.user_id,
                ActivityAction::ProjectCreated,
                Some(ActivityTarget::Project(project.id)),
            ),
        )
        .await;
        Ok(project)
    }

    async fn update(
        &self,
        actor: &Actor,
        id: &ProjectId,
        fields: Map<String, Value>,
    ) -> Result<Project, Error> {
        let project = self.load_owned(actor, id).await?;
        let Whitelisted { changes, .. } =
            apply_whitelisted_update::<ProjectChanges>(actor.role, &fields, &project)?;
        if changes.is_empty() {
            return Ok(project);
        }
        let updated = self
            .projects
            .update(id, &changes)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(PROJECT_NOT_FOUND))?;
        record_activity(
            self.activity.as_ref(),
            NewActivity::new(
                actor.user_id,
                ActivityAction::ProjectUpdated,
                Some(ActivityTarget::Project(updated.id)),
            ),
        )
        .await;
        Ok(updated)
    }

    async fn delete(&self, actor: &Actor, id: &ProjectId) -> Result<(), Error> {
        self.load_owned(actor, id).await?;
        let removed = self
            .projects
            .delete(id)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(Error::not_found(PROJECT_NOT_FOUND));
        }
        info!(project = %id, user = %actor.user_id, "project deleted");
        record_activity(
            self.activity.as_ref(),
            NewActivity::new(
                actor.user_id,
                ActivityAction::ProjectDeleted,
                Some(ActivityTarget::Project(*id)),
            ),
        )
        .await;
        Ok(())
    }
}

#[async_trait]
impl<P, A> ProjectQuery for ProjectService<P, A>
where
    P: ProjectRepository,
    A: ActivityLog,
{
    async fn get(&self, actor: &Actor, id: &ProjectId) -> Result<Project, Error> {
        self.load_owned(actor, id).await
    }

    async fn list(&self, actor: &Actor, filter: ProjectFilter) -> Result<Vec<Project>, Error> {
        self.projects
            .search(&actor.user_id, &filter)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "project_service_tests.rs"]
mod tests;
