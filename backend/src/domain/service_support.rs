//! Helpers shared by the domain services: repository error translation,
//! best-effort audit logging, and blocking work offload.

use serde_json::json;
use tracing::{debug, error, warn};

use super::ports::{ActivityLog, RepositoryError};
use super::{Error, NewActivity};

/// Message returned when storage cannot be reached.
pub const SERVICE_UNAVAILABLE: &str = "service unavailable";

/// Translate a repository failure into a sanitised domain error.
///
/// Adapter diagnostics are logged and never copied into the returned error.
pub(crate) fn map_repository_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            error!(%message, "repository connection failed");
            Error::service_unavailable(SERVICE_UNAVAILABLE)
        }
        RepositoryError::Query { message } => {
            error!(%message, "repository query failed");
            Error::internal("internal error")
        }
        RepositoryError::Conflict { field } => {
            debug!(%field, "unique constraint rejected write");
            Error::conflict(conflict_message(&field)).with_details(json!({ "field": field }))
        }
    }
}

fn conflict_message(field: &str) -> String {
    match field {
        "email" => "email already registered".to_owned(),
        "username" => "username already taken".to_owned(),
        "modelVersion" => "prediction already recorded for this model version".to_owned(),
        other => format!("{other} already exists"),
    }
}

/// Append an audit entry. Failures are logged and otherwise ignored so that
/// audit storage problems never fail the user's request.
pub(crate) async fn record_activity<A>(log: &A, entry: NewActivity)
where
    A: ActivityLog + ?Sized,
{
    if let Err(err) = log.append(&entry).await {
        warn!(
            error = %err,
            action = entry.action.as_str(),
            user = %entry.user_id,
            "failed to record activity"
        );
    }
}

/// Run CPU-bound work on the blocking pool.
pub(crate) async fn run_blocking<F, T>(work: F) -> Result<T, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        error!(error = %err, "blocking task failed");
        Error::internal("internal error")
    })
}
