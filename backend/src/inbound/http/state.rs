//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::RateLimiter;
use crate::domain::ports::{
    AccountCommand, AccountQuery, ActivityQuery, MoleculeCommand, MoleculeQuery,
    PredictionCommand, PredictionQuery, ProjectCommand, ProjectQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub projects: Arc<dyn ProjectCommand>,
    pub projects_query: Arc<dyn ProjectQuery>,
    pub molecules: Arc<dyn MoleculeCommand>,
    pub molecules_query: Arc<dyn MoleculeQuery>,
    pub predictions: Arc<dyn PredictionCommand>,
    pub predictions_query: Arc<dyn PredictionQuery>,
    pub activity: Arc<dyn ActivityQuery>,
}

/// Dependency bundle for HTTP handlers and the rate-limit middleware.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub projects: Arc<dyn ProjectCommand>,
    pub projects_query: Arc<dyn ProjectQuery>,
    pub molecules: Arc<dyn MoleculeCommand>,
    pub molecules_query: Arc<dyn MoleculeQuery>,
    pub predictions: Arc<dyn PredictionCommand>,
    pub predictions_query: Arc<dyn PredictionQuery>,
    pub activity: Arc<dyn ActivityQuery>,
    pub rate_limiter: RateLimiter,
}

impl HttpState {
    /// Construct state from a ports bundle and the shared limiter.
    ///
    /// # Examples
    /// ```no_run
    /// # fn demo(
    /// #     ports: discovery_backend::inbound::http::state::HttpStatePorts,
    /// #     limiter: discovery_backend::domain::RateLimiter,
    /// # ) {
    /// use discovery_backend::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(ports, limiter);
    /// let _accounts = state.accounts.clone();
    /// # }
    /// ```
    pub fn new(ports: HttpStatePorts, rate_limiter: RateLimiter) -> Self {
        let HttpStatePorts {
            accounts,
            accounts_query,
            projects,
            projects_query,
            molecules,
            molecules_query,
            predictions,
            predictions_query,
            activity,
        } = ports;
        Self {
            accounts,
            accounts_query,
            projects,
            projects_query,
            molecules,
            molecules_query,
            predictions,
            predictions_query,
            activity,
            rate_limiter,
        }
    }
}
