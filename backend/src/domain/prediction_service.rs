//! Prediction domain service. Predictions inherit their owner from the
//! molecule they describe.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::authorization::check_ownership;
use crate::domain::molecule_service::MOLECULE_NOT_FOUND;
use crate::domain::ports::{
    ActivityLog, MoleculeRepository, PredictionCommand, PredictionQuery, PredictionRepository,
};
use crate::domain::service_support::{map_repository_error, record_activity};
use crate::domain::validation::{ValidationCode, ValidationError};
use crate::domain::{
    ActivityAction, ActivityTarget, Actor, Error, MAX_BULK_PREDICTIONS, Molecule, MoleculeId,
    NewActivity, NewPrediction, Prediction, PredictionCategory, PredictionDraft,
    PredictionSummary,
};

/// Prediction service implementing [`PredictionCommand`] and
/// [`PredictionQuery`].
#[derive(Clone)]
pub struct PredictionService<M, R, A> {
    molecules: Arc<M>,
    predictions: Arc<R>,
    activity: Arc<A>,
}

impl<M, R, A> PredictionService<M, R, A> {
    pub fn new(molecules: Arc<M>, predictions: Arc<R>, activity: Arc<A>) -> Self {
        Self {
            molecules,
            predictions,
            activity,
        }
    }
}

impl<M, R, A> PredictionService<M, R, A>
where
    M: MoleculeRepository,
    R: PredictionRepository,
    A: ActivityLog,
{
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
}

#[async_trait]
impl<M, R, A> PredictionCommand for PredictionService<M, R, A>
where
    M: MoleculeRepository,
    R: PredictionRepository,
    A: ActivityLog,
{
    async fn record(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
        drafts: Vec<PredictionDraft>,
    ) -> Result<Vec<Prediction>, Error> {
        if drafts.is_empty() {
            return Err(ValidationError::new("predictions", ValidationCode::Required).into());
        }
        if drafts.len() > MAX_BULK_PREDICTIONS {
            return Err(Error::invalid_request(format!(
                "at most {MAX_BULK_PREDICTIONS} predictions per request"
            ))
            .with_details(json!({ "field": "predictions", "max": MAX_BULK_PREDICTIONS })));
        }
        let molecule = self.owned_molecule(actor, molecule).await?;
        let batch: Vec<NewPrediction> = drafts
            .into_iter()
            .map(|draft| draft.for_molecule(molecule.id))
            .collect();
        let recorded = self
            .predictions
            .bulk_create(&batch)
            .await
            .map_err(map_repository_error)?;
        debug!(molecule = %molecule.id, count = recorded.len(), "predictions recorded");
        let categories: Vec<&str> = recorded.iter().map(|p| p.category.as_str()).collect();
        record_activity(
            self.activity.as_ref(),
            NewActivity::new(
                actor.user_id,
                ActivityAction::PredictionsRecorded,
                Some(ActivityTarget::Molecule(molecule.id)),
            )
            .with_details(json!({ "count": recorded.len(), "categories": categories })),
        )
        .await;
        Ok(recorded)
    }
}

#[async_trait]
impl<M, R, A> PredictionQuery for PredictionService<M, R, A>
where
    M: MoleculeRepository,
    R: PredictionRepository,
    A: ActivityLog,
{
    async fn list(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
        category: Option<PredictionCategory>,
    ) -> Result<Vec<Prediction>, Error> {
        let molecule = self.owned_molecule(actor, molecule).await?;
        self.predictions
            .list_for_molecule(&molecule.id, category)
            .await
            .map_err(map_repository_error)
    }

    async fn latest(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
        category: PredictionCategory,
    ) -> Result<Prediction, Error> {
        let molecule = self.owned_molecule(actor, molecule).await?;
        self.predictions
            .latest_by_category(&molecule.id, category)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("no {category} prediction recorded")))
    }

    async fn summary(
        &self,
        actor: &Actor,
        molecule: &MoleculeId,
    ) -> Result<PredictionSummary, Error> {
        let molecule = self.owned_molecule(actor, molecule).await?;
        let newest_first = self
            .predictions
            .list_for_molecule(&molecule.id, None)
            .await
            .map_err(map_repository_error)?;
        Ok(PredictionSummary::from_newest_first(molecule.id, newest_first))
    }
}

#[cfg(test)]
#[path = "prediction_service_tests.rs"]
mod tests;
