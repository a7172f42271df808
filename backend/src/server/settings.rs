//! Server and rate-limit settings loaded via OrthoConfig.
//!
//! Values come from `DISCOVERY_*` and `RATE_LIMIT_*` environment variables
//! (or a configuration file). Command-line arguments are not consulted; the
//! binary passes only its program name.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use discovery_backend::domain::RateLimitPolicy;
use discovery_backend::inbound::http::auth_config::BuildMode;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const PROGRAM_NAME: &str = "discovery-backend";

/// Errors raised while validating loaded settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// Configuration sources could not be read or parsed.
    #[error("failed to load {section} settings: {message}")]
    Load {
        section: &'static str,
        message: String,
    },
    /// The bind address is not a socket address.
    #[error("invalid bind address '{value}'")]
    InvalidBindAddr { value: String },
    /// A setting required in release builds is absent.
    #[error("{name} must be set")]
    Missing { name: &'static str },
}

/// Listener and database settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DISCOVERY")]
pub struct ServerSettings {
    /// Socket address to bind; defaults to `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Per-query timeout in milliseconds.
    #[ortho_config(default = 5000)]
    pub db_timeout_ms: u64,
}

impl ServerSettings {
    /// Load from the environment and configuration files.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|err| SettingsError::Load {
            section: "server",
            message: err.to_string(),
        })
    }

    /// Parsed bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    /// Database URL; the service cannot start without one.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::Missing {
                name: "DISCOVERY_DATABASE_URL",
            })
    }

    /// Per-query timeout.
    pub fn db_timeout(&self) -> Duration {
        Duration::from_millis(self.db_timeout_ms)
    }
}

/// Shared counter store and limiter behaviour.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RATE_LIMIT")]
pub struct RateLimitSettings {
    /// Redis connection string for the shared counters.
    pub redis_url: Option<String>,
    /// Admit requests when Redis is unreachable.
    #[ortho_config(default = false)]
    pub fail_open: bool,
    /// Upper bound on one Redis round-trip in milliseconds.
    #[ortho_config(default = 250)]
    pub store_timeout_ms: u64,
    /// Switch enforcement off entirely.
    #[ortho_config(default = true)]
    pub enabled: bool,
}

impl RateLimitSettings {
    /// Load from the environment and configuration files.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|err| SettingsError::Load {
            section: "rate limit",
            message: err.to_string(),
        })
    }

    /// Redis URL when enforcement needs one.
    ///
    /// Release builds refuse to enforce limits without shared counters.
    /// Debug builds fall back to running unlimited.
    pub fn redis_url(&self, mode: BuildMode) -> Result<Option<&str>, SettingsError> {
        let url = self.redis_url.as_deref().filter(|url| !url.trim().is_empty());
        match (url, self.enabled, mode) {
            (None, true, BuildMode::Release) => Err(SettingsError::Missing {
                name: "RATE_LIMIT_REDIS_URL",
            }),
            (url, _, _) => Ok(url),
        }
    }

    /// Limiter policy. Enforcement requires a store.
    pub fn policy(&self, has_store: bool) -> RateLimitPolicy {
        RateLimitPolicy {
            enabled: self.enabled && has_store,
            fail_open: self.fail_open,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }
}
