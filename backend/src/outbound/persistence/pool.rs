//! Bounded `bb8` pool of `diesel-async` Postgres connections.
//!
//! Repositories check connections out per operation and hand them back on
//! drop. Checkout waits at most `connection_timeout`; the whole operation,
//! checkout included, is bounded by `query_timeout` in the repositories.

use std::fmt;
use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::domain::ports::{DependencyCheck, DependencyError};

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Failures building the pool or checking a connection out of it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became available, or the server refused one.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },
    /// The pool could not be constructed.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Pool settings. `Debug` output never includes the URL's password.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use discovery_backend::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://app:secret@db/discovery")
///     .with_max_size(20)
///     .with_query_timeout(Duration::from_secs(2));
/// assert!(!format!("{config:?}").contains("secret"));
/// ```
#[derive(Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
    query_timeout: Duration,
}

impl PoolConfig {
    /// Ten connections, no idle floor, five-second checkout and operation
    /// bounds.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            min_idle: None,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Cap on open connections; values below one are raised to one.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Upper bound for one repository operation, checkout included. Checkout
    /// alone never waits longer than this either.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self.connection_timeout = self.connection_timeout.min(timeout);
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// `database_url` with any password replaced by `***`.
fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_owned();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_owned(),
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("database_url", &redact_password(&self.database_url))
            .field("max_size", &self.max_size)
            .field("min_idle", &self.min_idle)
            .field("connection_timeout", &self.connection_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

/// Shared handle to the connection pool; clones share the same connections.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
    query_timeout: Duration,
}

impl DbPool {
    /// Build the pool. Connections are opened lazily up to `max_size`.
    ///
    /// # Errors
    /// Returns [`PoolError::Build`] when the manager rejects the
    /// configuration or the initial idle connections cannot be opened.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self {
            inner,
            query_timeout: config.query_timeout,
        })
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Check a connection out.
    ///
    /// # Errors
    /// Returns [`PoolError::Checkout`] when none is available within the
    /// checkout timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[async_trait::async_trait]
impl DependencyCheck for DbPool {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), DependencyError> {
        use diesel_async::RunQueryDsl;

        let ping = async {
            let mut conn = self.get().await?;
            diesel::sql_query("SELECT 1")
                .execute(&mut conn)
                .await
                .map(|_| ())
                .map_err(|err| PoolError::checkout(err.to_string()))
        };
        match tokio::time::timeout(self.query_timeout, ping).await {
            Ok(result) => result.map_err(|err| DependencyError::unhealthy(err.to_string())),
            Err(_) => Err(DependencyError::unhealthy("database ping timed out")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_server_settings() {
        let config = PoolConfig::new("postgres://localhost/discovery");

        assert_eq!(config.database_url(), "postgres://localhost/discovery");
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.min_idle, None);
        assert_eq!(config.query_timeout, DEFAULT_QUERY_TIMEOUT);
    }

    #[rstest]
    fn checkout_never_outlives_the_operation_bound() {
        let config = PoolConfig::new("postgres://localhost/discovery")
            .with_connection_timeout(Duration::from_secs(30))
            .with_query_timeout(Duration::from_millis(750));

        assert_eq!(config.connection_timeout, Duration::from_millis(750));
        assert_eq!(config.query_timeout, Duration::from_millis(750));
    }

    #[rstest]
    fn max_size_is_at_least_one() {
        let config = PoolConfig::new("postgres://localhost/discovery").with_max_size(0);
        assert_eq!(config.max_size, 1);
    }

    #[rstest]
    #[case("postgres://app:hunter2@db:5432/discovery", "postgres://app:***@db:5432/discovery")]
    #[case("postgres://app@db/discovery", "postgres://app@db/discovery")]
    #[case("postgres://db/discovery", "postgres://db/discovery")]
    #[case("not a url", "not a url")]
    fn passwords_are_redacted(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(redact_password(url), expected);
    }

    #[rstest]
    fn debug_output_hides_the_password() {
        let config = PoolConfig::new("postgres://app:hunter2@db/discovery");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("app:***@db"));
    }
}
