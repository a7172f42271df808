//! Builders wiring repositories, credential adapters, and domain services
//! into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use discovery_backend::domain::ports::{DisabledRateLimitStore, RateLimitStore};
use discovery_backend::domain::{
    AccountService, ActivityService, MoleculeService, PredictionService, ProjectService,
    RateLimiter,
};
use discovery_backend::inbound::http::state::{HttpState, HttpStatePorts};
use discovery_backend::outbound::credentials::{Argon2PasswordHasher, JwtSessionTokens};
use discovery_backend::outbound::persistence::{
    DbPool, DieselActivityLog, DieselMoleculeRepository, DieselPredictionRepository,
    DieselProjectRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Repositories shared by every service; one instance per process.
struct Repositories {
    users: Arc<DieselUserRepository>,
    projects: Arc<DieselProjectRepository>,
    molecules: Arc<DieselMoleculeRepository>,
    predictions: Arc<DieselPredictionRepository>,
    activity: Arc<DieselActivityLog>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            projects: Arc::new(DieselProjectRepository::new(pool.clone())),
            molecules: Arc::new(DieselMoleculeRepository::new(pool.clone())),
            predictions: Arc::new(DieselPredictionRepository::new(pool.clone())),
            activity: Arc::new(DieselActivityLog::new(pool.clone())),
        }
    }
}

fn build_ports(config: &ServerConfig) -> HttpStatePorts {
    let repos = Repositories::new(&config.db_pool);
    let tokens = JwtSessionTokens::new(config.auth.signing_key.expose(), config.auth.token_ttl);

    let accounts = Arc::new(AccountService::new(
        repos.users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(tokens),
        repos.activity.clone(),
        Arc::new(DefaultClock),
    ));
    let projects = Arc::new(ProjectService::new(
        repos.projects.clone(),
        repos.activity.clone(),
    ));
    let molecules = Arc::new(MoleculeService::new(
        repos.projects,
        repos.molecules.clone(),
        repos.activity.clone(),
    ));
    let predictions = Arc::new(PredictionService::new(
        repos.molecules,
        repos.predictions,
        repos.activity.clone(),
    ));
    let activity = Arc::new(ActivityService::new(repos.activity));

    HttpStatePorts {
        accounts: accounts.clone(),
        accounts_query: accounts,
        projects: projects.clone(),
        projects_query: projects,
        molecules: molecules.clone(),
        molecules_query: molecules,
        predictions: predictions.clone(),
        predictions_query: predictions,
        activity,
    }
}

fn build_rate_limiter(config: &ServerConfig) -> RateLimiter {
    let store: Arc<dyn RateLimitStore> = match &config.rate_limit_store {
        Some(store) => Arc::new(store.clone()),
        None => Arc::new(DisabledRateLimitStore),
    };
    RateLimiter::new(store, config.rate_limit_policy)
}

/// Build the shared HTTP state from the server configuration.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(
        build_ports(config),
        build_rate_limiter(config),
    ))
}
