//! PostgreSQL-backed `PredictionRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{PredictionRepository, RepositoryError};
use crate::domain::{MoleculeId, NewPrediction, Prediction, PredictionCategory};

use super::diesel_helpers::{bounded, map_diesel_error, map_pool_error};
use super::models::{NewPredictionRow, PredictionRow};
use super::pool::DbPool;
use super::schema::predictions;

/// Diesel-backed implementation of the `PredictionRepository` port.
#[derive(Clone)]
pub struct DieselPredictionRepository {
    pool: DbPool,
}

impl DieselPredictionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Predictions of one molecule, newest first. Rows inserted in one batch
/// share `created_at`, so `id` breaks ties to keep the order stable.
fn newest_first(molecule: &MoleculeId) -> predictions::BoxedQuery<'static, Pg> {
    predictions::table
        .filter(predictions::molecule_id.eq(*molecule.as_uuid()))
        .order((predictions::created_at.desc(), predictions::id.desc()))
        .into_boxed()
}

fn rows_to_predictions(rows: Vec<PredictionRow>) -> Result<Vec<Prediction>, RepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(RepositoryError::query))
        .collect()
}

#[async_trait]
impl PredictionRepository for DieselPredictionRepository {
    async fn bulk_create(
        &self,
        batch: &[NewPrediction],
    ) -> Result<Vec<Prediction>, RepositoryError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<NewPredictionRow<'_>> =
                batch.iter().map(NewPredictionRow::from).collect();
            let stored: Vec<PredictionRow> = conn
                .transaction(|conn| {
                    async move {
                        diesel::insert_into(predictions::table)
                            .values(&rows)
                            .returning(PredictionRow::as_returning())
                            .get_results(conn)
                            .await
                    }
                    .scope_boxed()
                })
                .await
                .map_err(map_diesel_error)?;
            rows_to_predictions(stored)
        })
        .await
    }

    async fn list_for_molecule(
        &self,
        molecule: &MoleculeId,
        category: Option<PredictionCategory>,
    ) -> Result<Vec<Prediction>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let mut query = newest_first(molecule);
            if let Some(wanted) = category {
                query = query.filter(predictions::category.eq(wanted.as_str()));
            }
            let rows: Vec<PredictionRow> = query
                .select(PredictionRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            rows_to_predictions(rows)
        })
        .await
    }

    async fn latest_by_category(
        &self,
        molecule: &MoleculeId,
        category: PredictionCategory,
    ) -> Result<Option<Prediction>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<PredictionRow> = newest_first(molecule)
                .filter(predictions::category.eq(category.as_str()))
                .select(PredictionRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(|found| found.into_domain().map_err(RepositoryError::query))
                .transpose()
        })
        .await
    }
}
