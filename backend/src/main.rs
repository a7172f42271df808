//! Backend entry-point: loads configuration, applies migrations, and serves
//! the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use discovery_backend::inbound::http::auth_config::{BuildMode, auth_settings_from_env};
use discovery_backend::inbound::http::health::HealthState;
use discovery_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use discovery_backend::outbound::rate_limit::{RedisRateLimitStore, RedisStoreConfig};

use server::{RateLimitSettings, ServerConfig, ServerSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let mode = BuildMode::from_debug_assertions();
    let settings = ServerSettings::from_env()?;
    let rate_settings = RateLimitSettings::from_env()?;
    let auth = auth_settings_from_env(&DefaultEnv::new(), mode)?;
    info!(
        key_fingerprint = %auth.signing_key.fingerprint(),
        token_ttl_minutes = auth.token_ttl.num_minutes(),
        "token settings loaded"
    );

    let database_url = settings.database_url()?;
    run_migrations(database_url).await?;
    let pool = DbPool::new(
        PoolConfig::new(database_url)
            .with_max_size(settings.db_max_connections)
            .with_query_timeout(settings.db_timeout()),
    )
    .await
    .wrap_err("failed to build database pool")?;

    let store = match rate_settings.redis_url(mode)? {
        Some(url) => Some(
            RedisRateLimitStore::connect(&RedisStoreConfig::new(url))
                .wrap_err("failed to configure rate limit store")?,
        ),
        None => {
            warn!("RATE_LIMIT_REDIS_URL unset; rate limiting disabled (dev only)");
            None
        }
    };
    let policy = rate_settings.policy(store.is_some());

    let config = ServerConfig::new(settings.bind_addr()?, pool, auth).with_rate_limit(store, policy);
    let health_state = web::Data::new(HealthState::new(config.dependency_checks()));
    info!(bind_addr = %config.bind_addr(), rate_limiting = policy.enabled, "starting server");
    let server = create_server(health_state, config)?;
    server.await.wrap_err("server terminated")
}
