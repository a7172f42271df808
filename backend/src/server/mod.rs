//! HTTP server assembly: settings, shared state, and the Actix app.

mod config;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::{RateLimitSettings, ServerSettings, SettingsError};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, HttpServer, web};

use discovery_backend::Trace;
#[cfg(debug_assertions)]
use discovery_backend::doc::ApiDoc;
use discovery_backend::domain::Error;
use discovery_backend::inbound::http::{ApiResult, configure};
use discovery_backend::inbound::http::health::{HealthState, live, ready};
use discovery_backend::inbound::http::state::HttpState;
use discovery_backend::inbound::http::validation::{json_config, path_config, query_config};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use state_builders::build_http_state;

/// Path prefix of every versioned route.
pub const API_PREFIX: &str = "/api/v1";

async fn unknown_route() -> ApiResult<HttpResponse> {
    Err(Error::not_found("route not found"))
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(web::scope(API_PREFIX).configure(configure))
        .service(ready)
        .service(live);

    // Interactive docs are a development aid only.
    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.default_service(web::to(unknown_route))
}

/// Bind the listener and start serving.
///
/// Readiness flips to true once the listener is bound; the readiness checks
/// captured in `health_state` still gate `/health/ready` afterwards.
///
/// # Errors
/// Returns [`std::io::Error`] when the socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = build_http_state(&config);
    let app_health = health_state.clone();
    let server = HttpServer::new(move || build_app(app_health.clone(), http_state.clone()))
        .bind(config.bind_addr())?
        .run();

    health_state.mark_ready();
    Ok(server)
}
