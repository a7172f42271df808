//! Port abstraction for molecule persistence adapters.
use async_trait::async_trait;

use crate::domain::{
    Molecule, MoleculeFilter, MoleculeId, MoleculeStatistics, NewMolecule, Page, ProjectId,
    Smiles, UserId,
};

use super::RepositoryError;

/// Storage for molecules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MoleculeRepository: Send + Sync {
    async fn create(&self, molecule: &NewMolecule) -> Result<Molecule, RepositoryError>;

    /// Insert every molecule in one transaction. Either all rows commit or
    /// none do.
    async fn bulk_create(&self, molecules: &[NewMolecule]) -> Result<Vec<Molecule>, RepositoryError>;

    async fn get_by_id(&self, id: &MoleculeId) -> Result<Option<Molecule>, RepositoryError>;

    /// Most recent molecule with this structure string owned by `owner`.
    async fn get_by_natural_key(
        &self,
        owner: &UserId,
        smiles: &Smiles,
    ) -> Result<Option<Molecule>, RepositoryError>;

    /// Molecules owned by `owner` matching `filter`, newest first.
    async fn search(
        &self,
        owner: &UserId,
        filter: &MoleculeFilter,
    ) -> Result<Vec<Molecule>, RepositoryError>;

    /// Molecules of one project, newest first.
    async fn list_for_project(
        &self,
        project: &ProjectId,
        page: Page,
    ) -> Result<Vec<Molecule>, RepositoryError>;

    async fn statistics(&self, project: &ProjectId) -> Result<MoleculeStatistics, RepositoryError>;

    /// Delete a molecule and its predictions. Returns `false` when nothing
    /// was deleted.
    async fn delete(&self, id: &MoleculeId) -> Result<bool, RepositoryError>;
}
