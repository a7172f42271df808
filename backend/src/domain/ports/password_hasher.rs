//! Port for one-way password hashing.
use crate::domain::{Password, PasswordHash};

use super::define_port_error;

define_port_error! {
    /// Failures producing a password hash.
    pub enum PasswordHashError {
        /// The hashing primitive rejected its inputs.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Salted, adaptive password hashing.
///
/// Both operations are CPU-bound; async callers run them on the blocking
/// thread pool.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` with a fresh random salt.
    fn hash_password(&self, password: &Password) -> Result<PasswordHash, PasswordHashError>;

    /// Constant-time comparison of `password` against `hash`. Malformed
    /// hashes verify as `false`.
    fn verify_password(&self, password: &str, hash: &PasswordHash) -> bool;

    /// Hash of no known password, encoded with the same cost parameters as
    /// real hashes. Verifying against it costs as much as a real check.
    fn decoy_hash(&self) -> PasswordHash;
}
