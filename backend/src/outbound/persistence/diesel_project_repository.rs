//! PostgreSQL-backed `ProjectRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ProjectRepository, RepositoryError};
use crate::domain::{NewProject, Project, ProjectChanges, ProjectFilter, ProjectId, UserId};

use super::diesel_helpers::{bounded, map_diesel_error, map_pool_error};
use super::models::{NewProjectRow, ProjectRow, ProjectUpdate};
use super::pool::DbPool;
use super::schema::projects;

/// Diesel-backed implementation of the `ProjectRepository` port.
#[derive(Clone)]
pub struct DieselProjectRepository {
    pool: DbPool,
}

impl DieselProjectRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Escape `LIKE` metacharacters so caller text matches literally.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl ProjectRepository for DieselProjectRepository {
    async fn create(&self, project: &NewProject) -> Result<Project, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row = NewProjectRow::new(Uuid::new_v4(), project);
            let stored: ProjectRow = diesel::insert_into(projects::table)
                .values(&row)
                .returning(ProjectRow::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(stored.into())
        })
        .await
    }

    async fn get_by_id(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<ProjectRow> = projects::table
                .filter(projects::id.eq(id.as_uuid()))
                .select(ProjectRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            Ok(row.map(Project::from))
        })
        .await
    }

    async fn search(
        &self,
        owner: &UserId,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let mut query = projects::table
                .filter(projects::user_id.eq(owner.as_uuid()))
                .select(ProjectRow::as_select())
                .into_boxed();
            if let Some(fragment) = filter.name_contains.as_deref() {
                query = query.filter(projects::name.ilike(like_pattern(fragment)));
            }
            let rows: Vec<ProjectRow> = query
                .order(projects::created_at.desc())
                .limit(i64::from(filter.limit))
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Project::from).collect())
        })
        .await
    }

    async fn update(
        &self,
        id: &ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, RepositoryError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<ProjectRow> =
                diesel::update(projects::table.filter(projects::id.eq(id.as_uuid())))
                    .set((
                        ProjectUpdate::from(changes),
                        projects::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(ProjectRow::as_returning())
                    .get_result(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?;
            Ok(row.map(Project::from))
        })
        .await
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, RepositoryError> {
        bounded(self.pool.query_timeout(), async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let removed = diesel::delete(projects::table.filter(projects::id.eq(id.as_uuid())))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(removed > 0)
        })
        .await
    }
}
