//! Shared helpers for Diesel repository implementations.
//!
//! This module provides the error mapping every repository uses:
//! - Pool checkout failures and closed connections map to
//!   `RepositoryError::Connection`.
//! - Unique violations map to `RepositoryError::Conflict`, naming the
//!   offending field by its constraint.
//! - Everything else maps to `RepositoryError::Query` with a generic message;
//!   driver details are logged at debug level and never returned.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::ports::RepositoryError;

use super::pool::PoolError;

/// Wire name of the field guarded by a unique constraint.
pub(crate) fn conflict_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "email",
        Some("users_username_key") => "username",
        Some("predictions_molecule_category_version_key") => "modelVersion",
        other => {
            warn!(constraint = ?other, "unrecognised unique constraint");
            "record"
        }
    }
}

/// Map pool errors to repository connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> RepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to repository errors.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> RepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            RepositoryError::conflict(conflict_field(info.constraint_name()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            RepositoryError::query("referenced record does not exist")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RepositoryError::connection("database connection error")
        }
        DieselError::NotFound => RepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => RepositoryError::query("database query error"),
        _ => RepositoryError::query("database error"),
    }
}

/// Run a repository operation under `limit`; elapsed operations are reported
/// as connection failures.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = limit.as_millis(), "database operation timed out");
            Err(RepositoryError::connection("database operation timed out"))
        }
    }
}
