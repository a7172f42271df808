//! PostgreSQL-backed `MoleculeRepository` implementation using Diesel ORM.
//!
//! Molecules carry a denormalised `user_id` so owner-scoped searches never
//! join through projects. Bulk inserts run in a single transaction: either
//! every molecule is stored or none is.

use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::dsl::{avg, count_star};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{MoleculeRepository, RepositoryError};
use crate::domain::{
    Molecule, MoleculeFilter, MoleculeId, MoleculeStatistics, NewMolecule, Page, ProjectId,
    Smiles, UserId,
};

use super::diesel_helpers::{bounded, map_diesel_error, map_pool_error};
use super::models::{MoleculeRow, NewMoleculeRow};
use super::pool::DbPool;
use super::schema::molecules;

/// Diesel-backed implementation of the `MoleculeRepository` port.
#[derive(Clone)]
pub struct DieselMoleculeRepository {
    pool: DbPool,
}

impl DieselMoleculeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn rows_to_molecules(rows: Vec<MoleculeRow>) -> Result<Vec<Molecule>, RepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(RepositoryError::query))
        .collect()
}

#[async_trait]
impl MoleculeRepository for DieselMoleculeRepository {
    async fn create(&self, molecule: &NewMolecule) -> Result<Molecule, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let stored: MoleculeRow = diesel::insert_into(molecules::table)
                .values(&NewMoleculeRow::from(molecule))
                .returning(MoleculeRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            stored.into_domain().map_err(RepositoryError::query)
        })
        .await
    }

    async fn bulk_create(&self, batch: &[NewMolecule]) -> Result<Vec<Molecule>, RepositoryError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<NewMoleculeRow<'_>> = batch.iter().map(NewMoleculeRow::from).collect();
            let stored: Vec<MoleculeRow> = conn
                .transaction(|conn| {
                    async move {
                        diesel::insert_into(molecules::table)
                            .values(&rows)
                            .returning(MoleculeRow::as_returning())
                            .get_results(conn)
                            .await
                    }
                    .scope_boxed()
                })
                .await
                .map_err(map_diesel_error)?;
            rows_to_molecules(stored)
        })
        .await
    }

    async fn get_by_id(&self, id: &MoleculeId) -> Result<Option<Molecule>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<MoleculeRow> = molecules::table
                .filter(molecules::id.eq(id.as_uuid()))
                .select(MoleculeRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(|found| found.into_domain().map_err(RepositoryError::query))
                .transpose()
        })
        .await
    }

    async fn get_by_natural_key(
        &self,
        owner: &UserId,
        smiles: &Smiles,
    ) -> Result<Option<Molecule>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<MoleculeRow> = molecules::table
                .filter(molecules::user_id.eq(owner.as_uuid()))
                .filter(molecules::smiles.eq(smiles.as_ref()))
                .order(molecules::created_at.desc())
                .select(MoleculeRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(|found| found.into_domain().map_err(RepositoryError::query))
                .transpose()
        })
        .await
    }

    async fn search(
        &self,
        owner: &UserId,
        filter: &MoleculeFilter,
    ) -> Result<Vec<Molecule>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let mut query = molecules::table
                .filter(molecules::user_id.eq(owner.as_uuid()))
                .select(MoleculeRow::as_select())
                .into_boxed();
            if let Some(min) = filter.min_molecular_weight {
                query = query.filter(molecules::molecular_weight.ge(min));
            }
            if let Some(max) = filter.max_molecular_weight {
                query = query.filter(molecules::molecular_weight.le(max));
            }
            if let Some(min) = filter.min_logp {
                query = query.filter(molecules::logp.ge(min));
            }
            if let Some(max) = filter.max_logp {
                query = query.filter(molecules::logp.le(max));
            }
            if let Some(min) = filter.min_qed {
                query = query.filter(molecules::qed.ge(min));
            }
            if let Some(max) = filter.max_qed {
                query = query.filter(molecules::qed.le(max));
            }
            if let Some(method) = filter.generation_method.as_deref() {
                query = query.filter(molecules::generation_method.eq(method));
            }
            let rows: Vec<MoleculeRow> = query
                .order(molecules::created_at.desc())
                .limit(i64::from(filter.limit))
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            rows_to_molecules(rows)
        })
        .await
    }

    async fn list_for_project(
        &self,
        project: &ProjectId,
        page: Page,
    ) -> Result<Vec<Molecule>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<MoleculeRow> = molecules::table
                .filter(molecules::project_id.eq(project.as_uuid()))
                .order((molecules::created_at.desc(), molecules::id.asc()))
                .limit(i64::from(page.limit))
                .offset(i64::from(page.offset))
                .select(MoleculeRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            rows_to_molecules(rows)
        })
        .await
    }

    async fn statistics(&self, project: &ProjectId) -> Result<MoleculeStatistics, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let (total_count, avg_molecular_weight, avg_logp, avg_qed): (
                i64,
                Option<f64>,
                Option<f64>,
                Option<f64>,
            ) = molecules::table
                .filter(molecules::project_id.eq(project.as_uuid()))
                .select((
                    count_star(),
                    avg(molecules::molecular_weight),
                    avg(molecules::logp),
                    avg(molecules::qed),
                ))
                .first(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            let methods: Vec<(String, i64)> = molecules::table
                .filter(molecules::project_id.eq(project.as_uuid()))
                .group_by(molecules::generation_method)
                .select((molecules::generation_method, count_star()))
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(MoleculeStatistics {
                total_count,
                avg_molecular_weight,
                avg_logp,
                avg_qed,
                generation_methods: methods.into_iter().collect::<BTreeMap<_, _>>(),
            })
        })
        .await
    }

    async fn delete(&self, id: &MoleculeId) -> Result<bool, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let removed = diesel::delete(molecules::table.filter(molecules::id.eq(id.as_uuid())))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(removed > 0)
        })
        .await
    }
}
