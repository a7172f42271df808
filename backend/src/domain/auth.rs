//! Authentication primitives: credentials, registrations, and the resolved
//! actor attached to authenticated requests.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::user::{Email, Role, SecureUser, Tier, Username};
use super::validation::{LABEL_MAX, ValidationError, validate_optional_text, validate_password};
use super::UserId;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Plaintext password, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a new password against the length policy.
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        validate_password(raw)?;
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Plaintext for hashing or verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Login credentials as submitted.
///
/// ## Invariants
/// - `email` is trimmed and lower-cased but not format-checked: a malformed
///   address simply fails to match any account, so the caller sees the same
///   generic failure as for a wrong password.
/// - `password` retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use discovery_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" A@X.com ", "Secret123!").unwrap();
/// assert_eq!(creds.email(), "a@x.com");
/// assert_eq!(creds.password(), "Secret123!");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_ascii_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for the account lookup.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated self-registration request.
///
/// Only identity and display fields are representable; tier, role, and
/// activity status are fixed by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: Email,
    pub username: Username,
    pub password: Password,
    pub full_name: Option<String>,
    pub institution: Option<String>,
}

impl Registration {
    /// Validate every registration field. Format checks complete before any
    /// storage round-trip.
    pub fn try_new(
        email: &str,
        username: &str,
        password: &str,
        full_name: Option<&str>,
        institution: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            email: Email::parse(email)?,
            username: Username::parse(username)?,
            password: Password::new(password)?,
            full_name: validate_optional_text("fullName", full_name, LABEL_MAX)?,
            institution: validate_optional_text("institution", institution, LABEL_MAX)?,
        })
    }
}

/// Identity, role, and tier of the authenticated caller, resolved from
/// storage on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    pub tier: Tier,
}

impl Actor {
    /// Whether the actor holds the administrative role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Signed, time-bounded session credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginSuccess {
    /// Bearer token for subsequent requests.
    #[schema(value_type = String)]
    #[serde(serialize_with = "serialize_token")]
    pub access_token: AccessToken,
    /// Always `bearer`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: SecureUser,
}

fn serialize_token<S: serde::Serializer>(token: &AccessToken, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(token.as_str())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::validation::ValidationCode;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("a@x.com", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn credential_debug_output_hides_password() {
        let creds = LoginCredentials::try_from_parts("a@x.com", "Secret123!").expect("valid");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("Secret123!"));
    }

    #[rstest]
    #[case("a@x.com", "alice", "short", "password", ValidationCode::TooShort { min: 8 })]
    #[case("not-an-email", "alice", "Secret123!", "email", ValidationCode::InvalidFormat)]
    #[case("a@x.com", "a b", "Secret123!", "username", ValidationCode::InvalidCharacters)]
    fn registration_rejects_invalid_fields(
        #[case] email: &str,
        #[case] username: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] code: ValidationCode,
    ) {
        let err = Registration::try_new(email, username, password, None, None)
            .expect_err("invalid registration");
        assert_eq!(err.field(), field);
        assert_eq!(err.code(), code);
    }

    #[rstest]
    fn registration_normalises_email() {
        let registration = Registration::try_new(" A@X.com", "alice", "Secret123!", Some(" "), None)
            .expect("valid registration");
        assert_eq!(registration.email.as_ref(), "a@x.com");
        assert_eq!(registration.full_name, None);
    }
}
