//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers translate requests into driving-port calls and never reach the
//! persistence or rate-limit adapters directly. [`configure`] mounts every
//! versioned route; the caller supplies the `/api/v1` scope.

use actix_web::web;

pub mod accounts;
pub mod activity;
pub mod auth;
pub mod auth_config;
pub mod error;
pub mod health;
pub mod molecules;
pub mod predictions;
pub mod projects;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

/// Register every versioned handler.
///
/// Literal molecule segments (`bulk`, `search`, `lookup`) are registered
/// before `/molecules/{id}` so they are not captured as identifiers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::register)
        .service(accounts::login)
        .service(accounts::current_user)
        .service(accounts::current_user_usage)
        .service(accounts::update_current_user)
        .service(accounts::change_tier)
        .service(accounts::update_user)
        .service(projects::list_projects)
        .service(projects::create_project)
        .service(projects::get_project)
        .service(projects::update_project)
        .service(projects::delete_project)
        .service(projects::list_project_molecules)
        .service(projects::project_statistics)
        .service(molecules::create_molecule)
        .service(molecules::bulk_create_molecules)
        .service(molecules::search_molecules)
        .service(molecules::lookup_molecule)
        .service(predictions::latest_prediction)
        .service(predictions::prediction_summary)
        .service(predictions::record_predictions)
        .service(predictions::list_predictions)
        .service(molecules::get_molecule)
        .service(molecules::delete_molecule)
        .service(activity::recent_activity);
}
