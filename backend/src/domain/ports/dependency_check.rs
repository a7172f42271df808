//! Port for checking that a backing dependency can serve traffic.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// A dependency failed its readiness check.
    pub enum DependencyError {
        /// The dependency did not answer or answered with an error.
        Unhealthy { message: String } => "dependency unhealthy: {message}",
    }
}

/// Cheap round-trip against one dependency, run by the readiness endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DependencyCheck: Send + Sync {
    /// Short label used in logs and the readiness body.
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), DependencyError>;
}
