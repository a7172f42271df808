//! Backend library modules.
//!
//! A multi-tenant resource access layer: every project, molecule, and
//! prediction is owned by exactly one user, and every read or write passes
//! an ownership check before it reaches storage.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
