//! Driving port for prediction reads.

use async_trait::async_trait;

use crate::domain::{
    Actor, Error, MoleculeId, Prediction, PredictionCategory, PredictionSummary,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionQuery: Send + Sync {
    /// Predictions for a molecule the actor owns.
    async fn list(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
        category: Option<PredictionCategory>,
    ) -> Result<Vec<Prediction>, Error>;

    /// Newest prediction of one category for a molecule the actor owns.
    async fn latest(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
        category: PredictionCategory,
    ) -> Result<Prediction, Error>;

    /// Newest prediction of every recorded category for a molecule the
    /// actor owns.
    async fn summary(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
    ) -> Result<PredictionSummary, Error>;
}
