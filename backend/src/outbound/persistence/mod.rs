//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Ownership and whitelist checks live in
//!   the domain services.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Bounded operations**: every repository call runs under the pool's
//!   query timeout and reports elapsed calls as connection failures.
//!
//! # Example
//!
//! ```ignore
//! use discovery_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/discovery")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_activity_log;
pub(crate) mod diesel_helpers;
mod diesel_molecule_repository;
mod diesel_prediction_repository;
mod diesel_project_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_activity_log::DieselActivityLog;
pub use diesel_molecule_repository::DieselMoleculeRepository;
pub use diesel_prediction_repository::DieselPredictionRepository;
pub use diesel_project_repository::DieselProjectRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
