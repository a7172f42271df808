//! Driving port for molecule mutations.

use async_trait::async_trait;

use crate::domain::{Actor, Error, Molecule, MoleculeDraft, MoleculeId, ProjectId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoleculeCommand: Send + Sync {
    /// Add one molecule to a project the actor owns.
    async fn create(
        &self,
        actor: &Actor,
        project: &ProjectId,
        draft: MoleculeDraft,
    ) -> Result<Molecule, Error>;

    /// Add a batch of already validated molecules atomically.
    async fn bulk_create(
        &self,
        actor: &Actor,
        project: &ProjectId,
        drafts: Vec<MoleculeDraft>,
    ) -> Result<Vec<Molecule>, Error>;

    /// Delete an owned molecule with its predictions.
    async fn delete(&self, actor: &Actor, id: &MoleculeId) -> Result<(), Error>;
}
