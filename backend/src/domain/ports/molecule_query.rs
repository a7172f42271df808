//! Driving port for molecule reads.

use async_trait::async_trait;

use crate::domain::{
    Actor, Error, Molecule, MoleculeFilter, MoleculeId, MoleculeStatistics, Page, ProjectId,
    Smiles,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoleculeQuery: Send + Sync {
    /// Fetch one molecule the actor owns.
    async fn get(&self, actor: &Actor, id: &MoleculeId) -> Result<Molecule, Error>;

    /// Find the actor's most recent molecule with this structure.
    async fn lookup(&self, actor: &Actor, smiles: &Smiles) -> Result<Molecule, Error>;

    /// Property search over the actor's own molecules.
    async fn search(&self, actor: &Actor, filter: MoleculeFilter) -> Result<Vec<Molecule>, Error>;

    /// Molecules of a project the actor owns.
    async fn list_for_project(
        &self,
        actor: &Actor,
        project: &ProjectId,
        page: Page,
    ) -> Result<Vec<Molecule>, Error>;

    /// Aggregate descriptors for a project the actor owns.
    async fn statistics(
        &self,
        actor: &Actor,
        project: &ProjectId,
    ) -> Result<MoleculeStatistics, Error>;
}
