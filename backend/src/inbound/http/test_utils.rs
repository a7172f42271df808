//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use crate::domain::ports::{
    MockAccountCommand, MockAccountQuery, MockActivityQuery, MockMoleculeCommand,
    MockMoleculeQuery, MockPredictionCommand, MockPredictionQuery, MockProjectCommand,
    MockProjectQuery, MockRateLimitStore, RateLimitStore,
};
use crate::domain::{RateLimitPolicy, RateLimiter};

use super::state::{HttpState, HttpStatePorts};

/// One mock per driving port. Tests set expectations on the ports they
/// exercise; any unexpected call panics.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountCommand,
    pub accounts_query: MockAccountQuery,
    pub projects: MockProjectCommand,
    pub projects_query: MockProjectQuery,
    pub molecules: MockMoleculeCommand,
    pub molecules_query: MockMoleculeQuery,
    pub predictions: MockPredictionCommand,
    pub predictions_query: MockPredictionQuery,
    pub activity: MockActivityQuery,
}

impl MockPorts {
    /// Move the mocks into an [`HttpState`].
    pub fn into_state(self, rate_limiter: RateLimiter) -> HttpState {
        HttpState::new(
            HttpStatePorts {
                accounts: Arc::new(self.accounts),
                accounts_query: Arc::new(self.accounts_query),
                projects: Arc::new(self.projects),
                projects_query: Arc::new(self.projects_query),
                molecules: Arc::new(self.molecules),
                molecules_query: Arc::new(self.molecules_query),
                predictions: Arc::new(self.predictions),
                predictions_query: Arc::new(self.predictions_query),
                activity: Arc::new(self.activity),
            },
            rate_limiter,
        )
    }
}

/// Limiter with enforcement switched off. The store is never consulted.
pub fn permissive_limiter() -> RateLimiter {
    limiter_with(
        MockRateLimitStore::new(),
        RateLimitPolicy {
            enabled: false,
            ..RateLimitPolicy::default()
        },
    )
}

/// Limiter over a caller-configured store mock.
pub fn limiter_with(store: MockRateLimitStore, policy: RateLimitPolicy) -> RateLimiter {
    let store: Arc<dyn RateLimitStore> = Arc::new(store);
    RateLimiter::new(store, policy)
}

pub use crate::test_support::api_app;
