//! Port abstraction for prediction persistence adapters.
use async_trait::async_trait;

use crate::domain::{MoleculeId, NewPrediction, Prediction, PredictionCategory};

use super::RepositoryError;

/// Append-only storage for predictions.
///
/// A prediction is unique per molecule, category, and model version; a
/// duplicate surfaces as [`RepositoryError::Conflict`] with `field` set to
/// `modelVersion`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    /// Insert every prediction in one transaction.
    async fn bulk_create(
        &self,
        predictions: &[NewPrediction],
    ) -> Result<Vec<Prediction>, RepositoryError>;

    /// Predictions for a molecule, newest first, optionally narrowed to one
    /// category.
    async fn list_for_molecule(
        &self,
        molecule: &MoleculeId,
        category: Option<PredictionCategory>,
    ) -> Result<Vec<Prediction>, RepositoryError>;

    async fn latest_by_category(
        &self,
        molecule: &MoleculeId,
        category: PredictionCategory,
    ) -> Result<Option<Prediction>, RepositoryError>;
}
