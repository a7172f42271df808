//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, credential primitives, the counter store)
//! expose strongly typed errors so adapters map their failures into
//! predictable variants. Driving ports (`*Command`, `*Query`) return the
//! domain [`Error`](crate::domain::Error) and are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_query;
mod activity_log;
mod activity_query;
mod dependency_check;
mod molecule_command;
mod molecule_query;
mod molecule_repository;
mod password_hasher;
mod prediction_command;
mod prediction_query;
mod prediction_repository;
mod project_command;
mod project_query;
mod project_repository;
mod rate_limit_store;
mod repository_error;
mod session_tokens;
mod user_repository;

pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_query::AccountQuery;
#[cfg(test)]
pub use account_query::MockAccountQuery;
pub use activity_log::ActivityLog;
#[cfg(test)]
pub use activity_log::MockActivityLog;
pub use activity_query::ActivityQuery;
#[cfg(test)]
pub use activity_query::MockActivityQuery;
#[cfg(test)]
pub use dependency_check::MockDependencyCheck;
pub use dependency_check::{DependencyCheck, DependencyError};
#[cfg(test)]
pub use molecule_command::MockMoleculeCommand;
pub use molecule_command::MoleculeCommand;
#[cfg(test)]
pub use molecule_query::MockMoleculeQuery;
pub use molecule_query::MoleculeQuery;
#[cfg(test)]
pub use molecule_repository::MockMoleculeRepository;
pub use molecule_repository::MoleculeRepository;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use prediction_command::MockPredictionCommand;
pub use prediction_command::PredictionCommand;
#[cfg(test)]
pub use prediction_query::MockPredictionQuery;
pub use prediction_query::PredictionQuery;
#[cfg(test)]
pub use prediction_repository::MockPredictionRepository;
pub use prediction_repository::PredictionRepository;
#[cfg(test)]
pub use project_command::MockProjectCommand;
pub use project_command::ProjectCommand;
#[cfg(test)]
pub use project_query::MockProjectQuery;
pub use project_query::ProjectQuery;
#[cfg(test)]
pub use project_repository::MockProjectRepository;
pub use project_repository::ProjectRepository;
#[cfg(test)]
pub use rate_limit_store::MockRateLimitStore;
pub use rate_limit_store::{
    DisabledRateLimitStore, RateLimitStore, RateLimitStoreError, WindowCount,
};
pub use repository_error::RepositoryError;
#[cfg(test)]
pub use session_tokens::MockSessionTokens;
pub use session_tokens::{IssuedToken, SessionTokens, TokenError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
