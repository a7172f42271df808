//! Project API handlers.
//!
//! ```text
//! GET /api/v1/projects?q=kinase&limit=20
//! POST /api/v1/projects {"name":"Kinase screen","diseaseTarget":"EGFR"}
//! GET /api/v1/projects/{id}
//! PUT /api/v1/projects/{id} {"description":"Second round"}
//! DELETE /api/v1/projects/{id}
//! GET /api/v1/projects/{id}/molecules?limit=50&offset=0
//! GET /api/v1/projects/{id}/statistics
//! ```
//!
//! Every route is owner-scoped: a project that exists but belongs to another
//! user yields `403`, a missing one `404`.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{
    Error, Molecule, MoleculeStatistics, Page, Project, ProjectDraft, ProjectFilter, ProjectId,
    RateClass,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};
use crate::middleware::RateLimit;

const PROJECT_ID: FieldName = FieldName::new("projectId");

/// Body of `POST /api/v1/projects`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub disease_target: Option<String>,
}

/// Keys accepted by `PUT /api/v1/projects/{id}`. Any other key is rejected.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub disease_target: Option<String>,
}

/// Query parameters for `GET /api/v1/projects`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListParams {
    /// Case-insensitive substring of the project name.
    pub q: Option<String>,
    pub limit: Option<u32>,
}

/// Paging parameters for a project's molecules.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// List the caller's projects, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(ProjectListParams),
    responses(
        (status = 200, description = "Projects owned by the caller", body = [Project]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["projects"],
    operation_id = "listProjects"
)]
#[get("/projects", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn list_projects(
    state: web::Data<HttpState>,
    auth: Authenticated,
    params: web::Query<ProjectListParams>,
) -> ApiResult<web::Json<Vec<Project>>> {
    let params = params.into_inner();
    let filter = ProjectFilter::try_new(params.q.as_deref(), params.limit)?;
    let projects = state.projects_query.list(auth.actor(), filter).await?;
    Ok(web::Json(projects))
}

/// Create a project owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["projects"],
    operation_id = "createProject"
)]
#[post("/projects", wrap = "RateLimit::new(RateClass::Create)")]
pub async fn create_project(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<CreateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let draft = ProjectDraft::try_new(
        &body.name,
        body.description.as_deref(),
        body.disease_target.as_deref(),
    )?;
    let project = state.projects.create(auth.actor(), draft).await?;
    Ok(HttpResponse::Created().json(project))
}

/// Fetch one project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = String, Path, description = "Project identifier")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["projects"],
    operation_id = "getProject"
)]
#[get("/projects/{id}", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn get_project(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Project>> {
    let id: ProjectId = parse_id(&path, PROJECT_ID)?;
    let project = state.projects_query.get(auth.actor(), &id).await?;
    Ok(web::Json(project))
}

/// Update a project's whitelisted fields.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(("id" = String, Path, description = "Project identifier")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated project", body = Project),
        (status = 400, description = "Field not allowed or invalid", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["projects"],
    operation_id = "updateProject"
)]
#[put("/projects/{id}", wrap = "RateLimit::new(RateClass::Create)")]
pub async fn update_project(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<web::Json<Project>> {
    let id: ProjectId = parse_id(&path, PROJECT_ID)?;
    let project = state
        .projects
        .update(auth.actor(), &id, payload.into_inner())
        .await?;
    Ok(web::Json(project))
}

/// Delete a project and, by cascade, its molecules and predictions.
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = String, Path, description = "Project identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["projects"],
    operation_id = "deleteProject"
)]
#[delete("/projects/{id}", wrap = "RateLimit::new(RateClass::Delete)")]
pub async fn delete_project(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ProjectId = parse_id(&path, PROJECT_ID)?;
    state.projects.delete(auth.actor(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Page through a project's molecules.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/molecules",
    params(("id" = String, Path, description = "Project identifier"), PageParams),
    responses(
        (status = 200, description = "Molecules in the project", body = [Molecule]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["projects"],
    operation_id = "listProjectMolecules"
)]
#[get("/projects/{id}/molecules", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn list_project_molecules(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Vec<Molecule>>> {
    let id: ProjectId = parse_id(&path, PROJECT_ID)?;
    let page = Page::try_new(params.limit, params.offset)?;
    let molecules = state
        .molecules_query
        .list_for_project(auth.actor(), &id, page)
        .await?;
    Ok(web::Json(molecules))
}

/// Aggregate descriptors for a project's molecules.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/statistics",
    params(("id" = String, Path, description = "Project identifier")),
    responses(
        (status = 200, description = "Project statistics", body = MoleculeStatistics),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["projects"],
    operation_id = "projectStatistics"
)]
#[get("/projects/{id}/statistics", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn project_statistics(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<MoleculeStatistics>> {
    let id: ProjectId = parse_id(&path, PROJECT_ID)?;
    let stats = state.molecules_query.statistics(auth.actor(), &id).await?;
    Ok(web::Json(stats))
}

#[cfg(test)]
#[path = "projects_tests.rs"]
mod tests;
