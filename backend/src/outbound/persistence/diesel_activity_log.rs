//! PostgreSQL-backed `ActivityLog` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ActivityLog, RepositoryError};
use crate::domain::{ActivityLogEntry, NewActivity, UserId};

use super::diesel_helpers::{bounded, map_diesel_error, map_pool_error};
use super::models::{ActivityRow, NewActivityRow};
use super::pool::DbPool;
use super::schema::activity_log;

/// Diesel-backed implementation of the `ActivityLog` port. Entries are
/// append-only; there is no update or delete path.
#[derive(Clone)]
pub struct DieselActivityLog {
    pool: DbPool,
}

impl DieselActivityLog {
    /// Create a new log with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLog for DieselActivityLog {
    async fn append(&self, entry: &NewActivity) -> Result<ActivityLogEntry, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let stored: ActivityRow = diesel::insert_into(activity_log::table)
                .values(&NewActivityRow::from(entry))
                .returning(ActivityRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            stored.into_domain().map_err(RepositoryError::query)
        })
        .await
    }

    async fn list_for_user(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<ActivityLogEntry>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<ActivityRow> = activity_log::table
                .filter(activity_log::user_id.eq(user.as_uuid()))
                .order(activity_log::created_at.desc())
                .limit(i64::from(limit))
                .select(ActivityRow::as_select())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            rows.into_iter()
                .map(|row| row.into_domain().map_err(RepositoryError::query))
                .collect()
        })
        .await
    }
}
