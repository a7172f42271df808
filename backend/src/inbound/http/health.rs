//! Health endpoints: liveness & readiness checks for orchestration and load balancers.
//! Document endpoints in OpenAPI via Utoipa.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::domain::ports::DependencyCheck;

/// Shared health state for readiness and liveness checks.
///
/// Readiness additionally runs every registered dependency check, so a
/// replica that loses its database or counter store drops out of rotation.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    dependencies: Vec<Arc<dyn DependencyCheck>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Per-dependency readiness outcome.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStatus {
    pub name: &'static str,
    pub healthy: bool,
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new(dependencies: Vec<Arc<dyn DependencyCheck>>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            dependencies,
        }
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state. When false, liveness checks emit 503 to trigger restarts.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn check_dependencies(&self) -> Vec<DependencyStatus> {
        let checks = self.dependencies.iter().map(|dependency| async move {
            let healthy = match dependency.check().await {
                Ok(()) => true,
                Err(err) => {
                    warn!(dependency = dependency.name(), error = %err, "dependency check failed");
                    false
                }
            };
            DependencyStatus {
                name: dependency.name(),
                healthy,
            }
        });
        join_all(checks).await
    }

    fn status_response(ok: bool) -> actix_web::HttpResponseBuilder {
        let mut response = if ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        response.insert_header((header::CACHE_CONTROL, "no-store"));
        response
    }
}

/// Readiness check. Return 200 when the server is initialised and every
/// dependency answers; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic", body = [DependencyStatus]),
        (
            status = 405,
            description = "Method not allowed; only GET requests are supported"
        ),
        (status = 503, description = "Server or a dependency is not ready", body = [DependencyStatus])
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    if !state.is_ready() {
        return HealthState::status_response(false).finish();
    }
    let dependencies = state.check_dependencies().await;
    let healthy = dependencies.iter().all(|dep| dep.healthy);
    HealthState::status_response(healthy).json(dependencies)
}

/// Liveness check. Return 200 while the process is marked alive and 503 once draining.
/// Call `HealthState::mark_unhealthy` before graceful shutdown to surface the drain early.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (
            status = 405,
            description = "Method not allowed; only GET requests are supported"
        ),
        (
            status = 503,
            description = "Server is shutting down"
        )
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::status_response(state.is_alive()).finish()
}
