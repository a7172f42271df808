//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Email and username uniqueness is enforced by the database; violations
//! surface as `RepositoryError::Conflict` naming the field.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{RepositoryError, UserRepository};
use crate::domain::{Email, NewUser, UsageCounts, User, UserChanges, UserId};

use super::diesel_helpers::{bounded, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow, UserUpdate};
use super::pool::DbPool;
use super::schema::{molecules, projects, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: UserRow) -> Result<User, RepositoryError> {
    row.into_domain().map_err(RepositoryError::query)
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row = NewUserRow::new(Uuid::new_v4(), user);
            let stored: UserRow = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            row_to_user(stored)
        })
        .await
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = users::table
                .filter(users::id.eq(id.as_uuid()))
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn get_by_natural_key(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = users::table
                .filter(users::email.eq(email.as_ref()))
                .select(UserRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn update(
        &self,
        id: &UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<UserRow> = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
                .set((UserUpdate::from(changes), users::updated_at.eq(diesel::dsl::now)))
                .returning(UserRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn usage_counts(&self, id: &UserId) -> Result<UsageCounts, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let project_count: i64 = projects::table
                .filter(projects::user_id.eq(id.as_uuid()))
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            let molecule_count: i64 = molecules::table
                .filter(molecules::user_id.eq(id.as_uuid()))
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(UsageCounts {
                projects: count_to_u64(project_count),
                molecules: count_to_u64(molecule_count),
            })
        })
        .await
    }
}
