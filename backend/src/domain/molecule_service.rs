//! Molecule domain service.
//!
//! Molecules are reached either directly by id or through their project.
//! Both paths check ownership of the record actually loaded, so a caller can
//! never attach molecules to, or read statistics from, a project they do not
//! own.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::authorization::check_ownership;
use crate::domain::ports::{
    ActivityLog, MoleculeCommand, MoleculeQuery, MoleculeRepository, ProjectRepository,
};
use crate::domain::project_service::PROJECT_NOT_FOUND;
use crate::domain::service_support::{map_repository_error, record_activity};
use crate::domain::validation::{ValidationCode, ValidationError};
use crate::domain::{
    ActivityAction, ActivityTarget, Actor, Error, MAX_BULK_MOLECULES, Molecule, MoleculeDraft,
    MoleculeFilter, MoleculeId, MoleculeStatistics, NewActivity, NewMolecule, Page, Project,
    ProjectId, Smiles,
};

pub(crate) const MOLECULE_NOT_FOUND: &str = "molecule not found";

/// Molecule service implementing [`MoleculeCommand`] and [`MoleculeQuery`].
#[derive(Clone)]
pub struct MoleculeService<P, M, A> {
    projects: Arc<P>,
    molecules: Arc<M>,
    activity: Arc<A>,
}

impl<P, M, A> MoleculeService<P, M, A> {
    pub fn new(projects: Arc<P>, molecules: Arc<M>, activity: Arc<A>) -> Self {
        Self {
            projects,
            molecules,
            activity,
        }
    }
}

impl<P, M, A> MoleculeService<P, M, A>
where
    P: ProjectRepository,
    M: MoleculeRepository,
    A: ActivityLog,
{
    /// Load the project and confirm the actor owns it.
    async fn owned_project(&self, actor: &Actor, id: &ProjectId) -> Result<Project, Error> {
        let project = self
            .projects
            .get_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(PROJECT_NOT_FOUND))?;
        check_ownership(&project, actor)?;
        Ok(project)
    }

    async fn owned_molecule(&self, actor: &Actor, id: &MoleculeId) -> Result<Molecule, Error> {
        let molecule = self
            .molecules
            .get_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(MOLECULE_NOT_FOUND))?;
        check_ownership(&molecule, actor)?;
        Ok(molecule)
    }

    async fn record_created(&self, actor: &Actor, project: ProjectId, ids: Vec<MoleculeId>) {
        let entry = NewActivity::new(
            actor.user_id,
            ActivityAction::MoleculesCreated,
            Some(ActivityTarget::Project(project)),
        )
        .with_details(json!({ "count": ids.len(), "moleculeIds": ids }));
        record_activity(self.activity.as_ref(), entry).await;
    }
}

fn validate_batch_size(len: usize) -> Result<(), Error> {
    if len == 0 {
        return Err(ValidationError::new("molecules", ValidationCode::Required).into());
    }
    if len > MAX_BULK_MOLECULES {
        return Err(Error::invalid_request(format!(
            "at most {MAX_BULK_MOLECULES} molecules per batch"
        ))
        .with_details(json!({ "field": "molecules", "max": MAX_BULK_MOLECULES })));
    }
    Ok(())
}

#[async_trait]
impl<P, M, A> MoleculeCommand for MoleculeService<P, M, A>
where
    P: ProjectRepository,
    M: MoleculeRepository,
    A: ActivityLog,
{
    async fn create(
        &self,
        actor: &Actor,
        project: &ProjectId,
        draft: MoleculeDraft,
    ) -> Result<Molecule, Error> {
        let project = self.owned_project(actor, project).await?;
        let molecule = self
            .molecules
            .create(&draft.into_new(project.id, project.user_id))
            .await
            .map_err(map_repository_error)?;
        debug!(molecule = %molecule.id, project = %project.id, "molecule created");
        self.record_created(actor, project.id, vec![molecule.id]).await;
        Ok(molecule)
    }

    async fn bulk_create(
        &self,
        actor: &Actor,
        project: &ProjectId,
        drafts: Vec<MoleculeDraft>,
    ) -> Result<Vec<Molecule>, Error> {
        validate_batch_size(drafts.len())?;
        let project = self.owned_project(actor, project).await?;
        let batch: Vec<NewMolecule> = drafts
            .into_iter()
            .map(|draft| draft.into_new(project.id, project.user_id))
            .collect();
        let created = self
            .molecules
            .bulk_create(&batch)
            .await
            .map_err(map_repository_error)?;
        info!(count = created.len(), project = %project.id, "molecule batch created");
        self.record_created(actor, project.id, created.iter().map(|m| m.id).collect())
            .await;
        Ok(created)
    }

    async fn delete(&self, actor: &Actor, id: &MoleculeId) -> Result<(), Error> {
        let molecule = self.owned_molecule(actor, id).await?;
        let removed = self
            .molecules
            .delete(id)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(Error::not_found(MOLECULE_NOT_FOUND));
        }
        record_activity(
            self.activity.as_ref(),
            NewActivity::new(
                actor.user_id,
                ActivityAction::MoleculeDeleted,
                Some(ActivityTarget::Molecule(molecule.id)),
            )
            .with_details(json!({ "projectId": molecule.project_id })),
        )
        .await;
        Ok(())
    }
}

#[async_trait]
impl<P, M, A> MoleculeQuery for MoleculeService<P, M, A>
where
    P: ProjectRepository,
    M: MoleculeRepository,
    A: ActivityLog,
{
    async fn get(&self, actor: &Actor, id: &MoleculeId) -> Result<Molecule, Error> {
        self.owned_molecule(actor, id).await
    }

    async fn lookup(&self, actor: &Actor, smiles: &Smiles) -> Result<Molecule, Error> {
        let molecule = self
            .molecules
            .get_by_natural_key(&actor.user_id, smiles)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(MOLECULE_NOT_FOUND))?;
        check_ownership(&molecule, actor)?;
        Ok(molecule)
    }

    async fn search(&self, actor: &Actor, filter: MoleculeFilter) -> Result<Vec<Molecule>, Error> {
        self.molecules
            .search(&actor.user_id, &filter)
            .await
            .map_err(map_repository_error)
    }

    async fn list_for_project(
        &self,
        actor: &Actor,
        project: &ProjectId,
        page: Page,
    ) -> Result<Vec<Molecule>, Error> {
        let project = self.owned_project(actor, project).await?;
        self.molecules
            .list_for_project(&project.id, page)
            .await
            .map_err(map_repository_error)
    }

    async fn statistics(
        &self,
        actor: &Actor,
        project: &ProjectId,
    ) -> Result<MoleculeStatistics, Error> {
        let project = self.owned_project(actor, project).await?;
        self.molecules
            .statistics(&project.id)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "molecule_service_tests.rs"]
mod tests;
