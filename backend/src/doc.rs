//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI document for the REST API. It registers
//! every handler under `/api/v1`, the health checks, the domain response
//! types, and the bearer-token security scheme.
//!
//! The document backs Swagger UI in debug builds and is exported by
//! `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    ActivityLogEntry, ActivityTarget, Error, ErrorCode, LoginSuccess, MolecularProperties,
    Molecule, MoleculeStatistics, Prediction, PredictionCategory, PredictionSummary, Project,
    SecureUser, Tier, UserUsage,
};
use crate::inbound::http::accounts::{
    AdminUserUpdateRequest, LoginRequest, ProfileUpdateRequest, RegisterRequest,
    TierChangeRequest,
};
use crate::inbound::http::molecules::{
    BulkCreateMoleculesRequest, CreateMoleculeRequest, MoleculeInput,
};
use crate::inbound::http::predictions::{PredictionInput, RecordPredictionsRequest};
use crate::inbound::http::projects::{CreateProjectRequest, UpdateProjectRequest};

/// Adds the bearer-token security scheme referenced by protected routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Discovery backend API",
        description = "Owner-scoped access to projects, molecules, and predictions.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::accounts::current_user_usage,
        crate::inbound::http::accounts::update_current_user,
        crate::inbound::http::accounts::change_tier,
        crate::inbound::http::accounts::update_user,
        crate::inbound::http::projects::list_projects,
        crate::inbound::http::projects::create_project,
        crate::inbound::http::projects::get_project,
        crate::inbound::http::projects::update_project,
        crate::inbound::http::projects::delete_project,
        crate::inbound::http::projects::list_project_molecules,
        crate::inbound::http::projects::project_statistics,
        crate::inbound::http::molecules::create_molecule,
        crate::inbound::http::molecules::bulk_create_molecules,
        crate::inbound::http::molecules::search_molecules,
        crate::inbound::http::molecules::lookup_molecule,
        crate::inbound::http::molecules::get_molecule,
        crate::inbound::http::molecules::delete_molecule,
        crate::inbound::http::predictions::record_predictions,
        crate::inbound::http::predictions::list_predictions,
        crate::inbound::http::predictions::latest_prediction,
        crate::inbound::http::predictions::prediction_summary,
        crate::inbound::http::activity::recent_activity,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        SecureUser,
        UserUsage,
        Tier,
        LoginSuccess,
        Project,
        Molecule,
        MolecularProperties,
        MoleculeStatistics,
        Prediction,
        PredictionCategory,
        PredictionSummary,
        ActivityLogEntry,
        ActivityTarget,
        RegisterRequest,
        LoginRequest,
        ProfileUpdateRequest,
        AdminUserUpdateRequest,
        TierChangeRequest,
        CreateProjectRequest,
        UpdateProjectRequest,
        MoleculeInput,
        CreateMoleculeRequest,
        BulkCreateMoleculesRequest,
        PredictionInput,
        RecordPredictionsRequest,
    )),
    tags(
        (name = "accounts", description = "Registration, login, and account management"),
        (name = "projects", description = "Owner-scoped research projects"),
        (name = "molecules", description = "Molecules and property search"),
        (name = "predictions", description = "Model predictions recorded against molecules"),
        (name = "activity", description = "The caller's audit trail"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
