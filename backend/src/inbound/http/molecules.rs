//! Molecule API handlers.
//!
//! ```text
//! POST /api/v1/molecules {"projectId":"...","smiles":"CCO","qed":0.41}
//! POST /api/v1/molecules/bulk {"projectId":"...","molecules":[{"smiles":"CCO"}]}
//! GET /api/v1/molecules/search?minQed=0.5&limit=20
//! GET /api/v1/molecules/lookup?smiles=CCO
//! GET /api/v1/molecules/{id}
//! DELETE /api/v1/molecules/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::Deserialize;

use crate::domain::validation::ValidationError;
use crate::domain::{
    DEFAULT_SEARCH_LIMIT, Error, MolecularProperties, Molecule, MoleculeDraft, MoleculeFilter,
    MoleculeId, ProjectId, RateClass, Smiles,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, indexed, parse_id};
use crate::middleware::RateLimit;

const MOLECULE_ID: FieldName = FieldName::new("moleculeId");
const PROJECT_ID: FieldName = FieldName::new("projectId");

/// One molecule as supplied by a client.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoleculeInput {
    pub smiles: String,
    pub name: Option<String>,
    /// Defaults to `manual`.
    pub generation_method: Option<String>,
    #[serde(flatten)]
    pub properties: MolecularProperties,
}

impl MoleculeInput {
    fn into_draft(self) -> Result<MoleculeDraft, ValidationError> {
        MoleculeDraft::try_new(
            &self.smiles,
            self.name.as_deref(),
            self.generation_method.as_deref(),
            self.properties,
        )
    }
}

/// Body of `POST /api/v1/molecules`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMoleculeRequest {
    pub project_id: String,
    #[serde(flatten)]
    pub molecule: MoleculeInput,
}

/// Body of `POST /api/v1/molecules/bulk`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateMoleculesRequest {
    pub project_id: String,
    pub molecules: Vec<MoleculeInput>,
}

/// Property filters for `GET /api/v1/molecules/search`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MoleculeSearchParams {
    pub min_molecular_weight: Option<f64>,
    pub max_molecular_weight: Option<f64>,
    pub min_logp: Option<f64>,
    pub max_logp: Option<f64>,
    pub min_qed: Option<f64>,
    pub max_qed: Option<f64>,
    pub generation_method: Option<String>,
    pub limit: Option<u32>,
}

impl From<MoleculeSearchParams> for MoleculeFilter {
    fn from(params: MoleculeSearchParams) -> Self {
        Self {
            min_molecular_weight: params.min_molecular_weight,
            max_molecular_weight: params.max_molecular_weight,
            min_logp: params.min_logp,
            max_logp: params.max_logp,
            min_qed: params.min_qed,
            max_qed: params.max_qed,
            generation_method: params.generation_method,
            limit: params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        }
    }
}

/// Query for `GET /api/v1/molecules/lookup`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupParams {
    pub smiles: String,
}

/// Add a molecule to a project the caller owns.
#[utoipa::path(
    post,
    path = "/api/v1/molecules",
    request_body = CreateMoleculeRequest,
    responses(
        (status = 201, description = "Molecule created", body = Molecule),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Project owned by another user", body = Error),
        (status = 404, description = "Project not found", body = Error)
    ),
    tags = ["molecules"],
    operation_id = "createMolecule"
)]
#[post("/molecules", wrap = "RateLimit::new(RateClass::Create)")]
pub async fn create_molecule(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<CreateMoleculeRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let project_id: ProjectId = parse_id(&body.project_id, PROJECT_ID)?;
    let draft = body.molecule.into_draft()?;
    let molecule = state
        .molecules
        .create(auth.actor(), &project_id, draft)
        .await?;
    Ok(HttpResponse::Created().json(molecule))
}

/// Add up to a fixed number of molecules in one transaction.
///
/// Either every molecule is stored or none is.
#[utoipa::path(
    post,
    path = "/api/v1/molecules/bulk",
    request_body = BulkCreateMoleculesRequest,
    responses(
        (status = 201, description = "Molecules created", body = [Molecule]),
        (status = 400, description = "Invalid request or batch too large", body = Error),
        (status = 403, description = "Project owned by another user", body = Error),
        (status = 404, description = "Project not found", body = Error)
    ),
    tags = ["molecules"],
    operation_id = "bulkCreateMolecules"
)]
#[post("/molecules/bulk", wrap = "RateLimit::new(RateClass::BulkCreate)")]
pub async fn bulk_create_molecules(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<BulkCreateMoleculesRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let project_id: ProjectId = parse_id(&body.project_id, PROJECT_ID)?;
    let drafts = body
        .molecules
        .into_iter()
        .enumerate()
        .map(|(index, input)| input.into_draft().map_err(|err| indexed(index, err)))
        .collect::<Result<Vec<_>, _>>()?;
    let stored = state
        .molecules
        .bulk_create(auth.actor(), &project_id, drafts)
        .await?;
    Ok(HttpResponse::Created().json(stored))
}

/// Property search across the caller's own molecules.
#[utoipa::path(
    get,
    path = "/api/v1/molecules/search",
    params(MoleculeSearchParams),
    responses(
        (status = 200, description = "Matching molecules", body = [Molecule]),
        (status = 400, description = "Invalid filter", body = Error)
    ),
    tags = ["molecules"],
    operation_id = "searchMolecules"
)]
#[get("/molecules/search", wrap = "RateLimit::new(RateClass::Search)")]
pub async fn search_molecules(
    state: web::Data<HttpState>,
    auth: Authenticated,
    params: web::Query<MoleculeSearchParams>,
) -> ApiResult<web::Json<Vec<Molecule>>> {
    let filter = MoleculeFilter::from(params.into_inner()).validate()?;
    let molecules = state.molecules_query.search(auth.actor(), filter).await?;
    Ok(web::Json(molecules))
}

/// Find the caller's most recent molecule with this structure.
#[utoipa::path(
    get,
    path = "/api/v1/molecules/lookup",
    params(LookupParams),
    responses(
        (status = 200, description = "Molecule", body = Molecule),
        (status = 400, description = "Invalid structure", body = Error),
        (status = 404, description = "No molecule with this structure", body = Error)
    ),
    tags = ["molecules"],
    operation_id = "lookupMolecule"
)]
#[get("/molecules/lookup", wrap = "RateLimit::new(RateClass::Search)")]
pub async fn lookup_molecule(
    state: web::Data<HttpState>,
    auth: Authenticated,
    params: web::Query<LookupParams>,
) -> ApiResult<web::Json<Molecule>> {
    let smiles = Smiles::parse(&params.smiles)?;
    let molecule = state.molecules_query.lookup(auth.actor(), &smiles).await?;
    Ok(web::Json(molecule))
}

/// Fetch one molecule.
#[utoipa::path(
    get,
    path = "/api/v1/molecules/{id}",
    params(("id" = String, Path, description = "Molecule identifier")),
    responses(
        (status = 200, description = "Molecule", body = Molecule),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["molecules"],
    operation_id = "getMolecule"
)]
#[get("/molecules/{id}", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn get_molecule(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Molecule>> {
    let id: MoleculeId = parse_id(&path, MOLECULE_ID)?;
    let molecule = state.molecules_query.get(auth.actor(), &id).await?;
    Ok(web::Json(molecule))
}

/// Delete a molecule and its predictions.
#[utoipa::path(
    delete,
    path = "/api/v1/molecules/{id}",
    params(("id" = String, Path, description = "Molecule identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Owned by another user", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["molecules"],
    operation_id = "deleteMolecule"
)]
#[delete("/molecules/{id}", wrap = "RateLimit::new(RateClass::Delete)")]
pub async fn delete_molecule(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: MoleculeId = parse_id(&path, MOLECULE_ID)?;
    state.molecules.delete(auth.actor(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "molecules_tests.rs"]
mod tests;
