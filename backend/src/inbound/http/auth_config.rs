//! Access-token configuration parsing and validation.
//!
//! This module centralises the environment-driven token settings so they are
//! validated consistently and can be tested in isolation. The signing key is
//! required in every build; release builds additionally reject short keys
//! and malformed lifetimes instead of falling back to defaults.

use std::fmt;

use chrono::Duration;
use mockable::Env;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroizing;

const SIGNING_KEY_ENV: &str = "AUTH_SIGNING_KEY";
const TOKEN_TTL_ENV: &str = "AUTH_TOKEN_TTL_MINUTES";
const SIGNING_KEY_MIN_LEN: usize = 32;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
const MAX_TOKEN_TTL_MINUTES: i64 = 1440;
const TTL_EXPECTED: &str = "integer minutes in 1..=1440";
const FINGERPRINT_BYTES: usize = 8;

/// Build mode for configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for weak settings.
    Debug,
    /// Release builds require explicit, valid settings.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use discovery_backend::inbound::http::auth_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// HMAC secret for access tokens. Zeroed on drop and never printed.
#[derive(Clone)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    /// Wrap raw key material.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// Key bytes, for constructing the token adapter.
    pub fn expose(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Truncated SHA-256 fingerprint, safe to log, so operators can tell
    /// which key is active without seeing it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use discovery_backend::inbound::http::auth_config::SigningKey;
    ///
    /// let fp = SigningKey::new(vec![b'k'; 32]).fingerprint();
    /// assert_eq!(fp.len(), 16);
    /// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    /// ```
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.expose());
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({})", self.fingerprint())
    }
}

/// Token settings derived from configuration.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HS256 signing key.
    pub signing_key: SigningKey,
    /// Lifetime of issued access tokens.
    pub token_ttl: Duration,
}

/// Errors raised while validating token configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AuthConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The signing key is too short for release builds.
    #[error("{name} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        name: &'static str,
        length: usize,
        min_len: usize,
    },
}

/// Build token settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use discovery_backend::inbound::http::auth_config::{auth_settings_from_env, BuildMode};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "AUTH_SIGNING_KEY" => Some("k".repeat(32)),
///     "AUTH_TOKEN_TTL_MINUTES" => Some("15".to_owned()),
///     _ => None,
/// });
///
/// let settings = auth_settings_from_env(&env, BuildMode::Release).unwrap();
/// assert_eq!(settings.token_ttl.num_minutes(), 15);
/// ```
pub fn auth_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<AuthSettings, AuthConfigError> {
    let signing_key = signing_key_from_env(env, mode)?;
    let token_ttl = token_ttl_from_env(env, mode)?;
    Ok(AuthSettings {
        signing_key,
        token_ttl,
    })
}

fn signing_key_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<SigningKey, AuthConfigError> {
    let raw = Zeroizing::new(
        env.string(SIGNING_KEY_ENV)
            .filter(|value| !value.is_empty())
            .ok_or(AuthConfigError::MissingEnv {
                name: SIGNING_KEY_ENV,
            })?,
    );
    let length = raw.len();
    if length < SIGNING_KEY_MIN_LEN {
        if mode.is_debug() {
            warn!(length, "AUTH_SIGNING_KEY shorter than 32 bytes (dev only)");
        } else {
            return Err(AuthConfigError::KeyTooShort {
                name: SIGNING_KEY_ENV,
                length,
                min_len: SIGNING_KEY_MIN_LEN,
            });
        }
    }
    Ok(SigningKey::new(raw.as_bytes()))
}

fn token_ttl_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, AuthConfigError> {
    let Some(value) = env.string(TOKEN_TTL_ENV) else {
        return Ok(Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES));
    };
    match value.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) => {
            Ok(Duration::minutes(minutes))
        }
        _ if mode.is_debug() => {
            warn!(value = %value, "invalid AUTH_TOKEN_TTL_MINUTES; using default");
            Ok(Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES))
        }
        _ => Err(AuthConfigError::InvalidEnv {
            name: TOKEN_TTL_ENV,
            value,
            expected: TTL_EXPECTED,
        }),
    }
}

#[cfg(test)]
mod tests;
