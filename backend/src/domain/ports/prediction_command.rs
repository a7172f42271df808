//! Driving port for recording predictions.

use async_trait::async_trait;

use crate::domain::{Actor, Error, MoleculeId, Prediction, PredictionDraft};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionCommand: Send + Sync {
    /// Record predictions for a molecule the actor owns, atomically.
    async fn record(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
        drafts: Vec<PredictionDraft>,
    ) -> Result<Vec<Prediction>, Error>;
}
