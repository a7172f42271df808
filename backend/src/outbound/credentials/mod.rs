//! Credential adapters: Argon2id password hashing and HS256 access tokens.
//!
//! Both adapters are synchronous and CPU-bound; domain services run them on
//! the blocking pool.

mod argon2_password_hasher;
mod jwt_session_tokens;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use jwt_session_tokens::JwtSessionTokens;
