//! Port for signed session tokens.
use chrono::{DateTime, Utc};

use crate::domain::{AccessToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Reasons a token was not issued or not accepted.
    pub enum TokenError {
        /// Token could not be decoded.
        Malformed => "token is malformed",
        /// Signature did not verify against the configured key.
        InvalidSignature => "token signature is invalid",
        /// Token lifetime has elapsed.
        Expired => "token has expired",
        /// Subject claim missing or not a user identifier.
        InvalidSubject => "token subject is invalid",
        /// Encoding a new token failed.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// Freshly issued token with its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: AccessToken,
    /// Seconds until expiry.
    pub expires_in: i64,
}

/// Issue and verify tamper-evident, time-bounded session tokens.
#[cfg_attr(test, mockall::automock)]
pub trait SessionTokens: Send + Sync {
    /// Issue a token for `user_id` valid from `issued_at`.
    fn create_access_token(
        &self,
        user_id: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError>;

    /// Verify signature and expiry at `now`, returning the subject.
    fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError>;
}
