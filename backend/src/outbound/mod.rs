//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **credentials**: Argon2id password hashing and HS256 session tokens
//! - **rate_limit**: Redis-backed shared counters for the rate limiter
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod credentials;
pub mod persistence;
pub mod rate_limit;
