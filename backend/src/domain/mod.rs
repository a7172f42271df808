//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the strongly typed entities shared by the HTTP and
//! persistence adapters, and the services that enforce identity, ownership,
//! and update whitelists before any adapter sees a request.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Entities: `User`, `Project`, `Molecule`, `Prediction`, `ActivityLogEntry`.
//! - Guards: [`authorization::check_ownership`] and
//!   [`authorization::apply_whitelisted_update`].
//! - Services: one per aggregate, each implementing its driving ports.

pub mod error;
pub mod trace_id;
pub mod validation;

mod ids;

mod activity;
mod auth;
mod molecule;
mod prediction;
mod project;
mod user;

pub mod authorization;
pub mod ports;
pub mod rate_limit;

mod service_support;

mod account_service;
mod activity_service;
mod molecule_service;
mod prediction_service;
mod project_service;

pub use self::account_service::{
    ACCOUNT_DEACTIVATED, AccountService, INVALID_CREDENTIALS, INVALID_TOKEN,
};
pub use self::activity::{
    ActivityAction, ActivityLogEntry, ActivityTarget, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT,
    NewActivity,
};
pub use self::activity_service::ActivityService;
pub use self::auth::{
    AccessToken, Actor, LoginCredentials, LoginSuccess, LoginValidationError, Password,
    Registration,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{ActivityId, MoleculeId, PredictionId, ProjectId, UserId};
pub use self::molecule::{
    DEFAULT_GENERATION_METHOD, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT, DESCRIPTOR_COUNT_MAX,
    MAX_BULK_MOLECULES, MAX_SEARCH_LIMIT, MolecularProperties, Molecule, MoleculeDraft,
    MoleculeFilter, MoleculeStatistics, NewMolecule, Page, Smiles,
};
pub use self::molecule_service::MoleculeService;
pub use self::prediction::{
    DEFAULT_MODEL_VERSION, MAX_BULK_PREDICTIONS, NewPrediction, Prediction, PredictionCategory,
    PredictionDraft, PredictionSummary,
};
pub use self::prediction_service::PredictionService;
pub use self::project::{
    DEFAULT_PROJECT_LIMIT, MAX_PROJECT_LIMIT, NewProject, Project, ProjectChanges, ProjectDraft,
    ProjectFilter,
};
pub use self::project_service::ProjectService;
pub use self::rate_limit::{
    ClientKey, RateClass, RateLimitPolicy, RateLimiter, RateWindow, tier_window,
};
pub use self::service_support::SERVICE_UNAVAILABLE;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    AdminUserChanges, Email, NewUser, PasswordHash, ProfileChanges, Role, SecureUser, Tier,
    TierChange, UsageCounts, User, UserChanges, UserRecord, UserUsage, Username,
};
