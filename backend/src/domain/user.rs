//! User accounts and their outward projection.
//!
//! [`User`] is the full stored record and deliberately does not implement
//! `Serialize`. Everything leaving the service goes through [`SecureUser`],
//! which has no field for the password hash.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{ValidationCode, ValidationError, validate_email, validate_username};
use super::UserId;

/// Normalised, syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "a@x.com")]
pub struct Email(String);

impl Email {
    /// Validate and normalise (trim, lower-case) an email address.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_email(raw).map(Self)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public handle chosen at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "alice")]
pub struct Username(String);

impl Username {
    /// Validate a username.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_username(raw).map(Self)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subscription level controlling rate-limit ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Default tier for new registrations.
    #[default]
    Free,
    /// Paid tier.
    Pro,
    /// Organisation tier.
    Enterprise,
}

impl Tier {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(ValidationError::new("tier", ValidationCode::UnknownValue)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization role resolved from storage, never from request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Ordinary account; may act only on owned resources.
    #[default]
    Member,
    /// Administrative account; bypasses ownership explicitly.
    Admin,
}

impl Role {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            _ => Err(ValidationError::new("role", ValidationCode::UnknownValue)),
        }
    }
}

/// Encoded one-way password hash (PHC string).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a password hasher or read from storage.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded representation for storage and verification.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Field values used to rebuild a [`User`] from storage.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: Email,
    pub username: Username,
    pub password_hash: PasswordHash,
    pub full_name: Option<String>,
    pub institution: Option<String>,
    pub tier: Tier,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored user account.
///
/// ## Invariants
/// - `tier` and `role` are closed enums; no other value can be represented.
/// - The password hash is only reachable through [`User::password_hash`].
#[derive(Debug, Clone)]
pub struct User {
    record: UserRecord,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self { record }
    }
}

impl User {
    pub fn id(&self) -> UserId {
        self.record.id
    }

    pub fn email(&self) -> &Email {
        &self.record.email
    }

    pub fn username(&self) -> &Username {
        &self.record.username
    }

    /// Stored hash, for credential verification only.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.record.password_hash
    }

    pub fn full_name(&self) -> Option<&str> {
        self.record.full_name.as_deref()
    }

    pub fn institution(&self) -> Option<&str> {
        self.record.institution.as_deref()
    }

    pub fn tier(&self) -> Tier {
        self.record.tier
    }

    pub fn role(&self) -> Role {
        self.record.role
    }

    pub fn is_active(&self) -> bool {
        self.record.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.record.updated_at
    }

    /// Copy of this user with `changes` applied in memory.
    #[must_use]
    pub fn with_changes(&self, changes: &UserChanges) -> Self {
        let mut record = self.record.clone();
        if let Some(full_name) = &changes.full_name {
            record.full_name.clone_from(full_name);
        }
        if let Some(institution) = &changes.institution {
            record.institution.clone_from(institution);
        }
        if let Some(tier) = changes.tier {
            record.tier = tier;
        }
        if let Some(is_active) = changes.is_active {
            record.is_active = is_active;
        }
        Self { record }
    }
}

/// Registration data accepted by the user repository.
///
/// Tier, role, and activity status are not part of this type: new accounts
/// are always `free`, `member`, and active.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub username: Username,
    pub password_hash: PasswordHash,
    pub full_name: Option<String>,
    pub institution: Option<String>,
}

/// Storage-level user mutation. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub full_name: Option<Option<String>>,
    pub institution: Option<Option<String>>,
    pub tier: Option<Tier>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    /// True when no column would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.institution.is_none()
            && self.tier.is_none()
            && self.is_active.is_none()
    }
}

/// Self-service profile edit: display fields only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: Option<Option<String>>,
    pub institution: Option<Option<String>>,
}

impl From<ProfileChanges> for UserChanges {
    fn from(value: ProfileChanges) -> Self {
        Self {
            full_name: value.full_name,
            institution: value.institution,
            ..Self::default()
        }
    }
}

/// Administrative account edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUserChanges {
    pub full_name: Option<Option<String>>,
    pub institution: Option<Option<String>>,
    pub tier: Option<Tier>,
    pub is_active: Option<bool>,
}

impl From<AdminUserChanges> for UserChanges {
    fn from(value: AdminUserChanges) -> Self {
        Self {
            full_name: value.full_name,
            institution: value.institution,
            tier: value.tier,
            is_active: value.is_active,
        }
    }
}

/// Administrative tier assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierChange {
    pub tier: Option<Tier>,
}

impl From<TierChange> for UserChanges {
    fn from(value: TierChange) -> Self {
        Self {
            tier: value.tier,
            ..Self::default()
        }
    }
}

/// Stored-resource totals for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounts {
    pub projects: u64,
    pub molecules: u64,
}

/// Account usage reported to its owner, for tier-limit decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUsage {
    pub user_id: UserId,
    pub tier: Tier,
    pub is_active: bool,
    pub project_count: u64,
    pub molecule_count: u64,
}

impl UserUsage {
    pub fn new(user: &User, counts: UsageCounts) -> Self {
        Self {
            user_id: user.id(),
            tier: user.tier(),
            is_active: user.is_active(),
            project_count: counts.projects,
            molecule_count: counts.molecules,
        }
    }
}

/// Allow-listed outward representation of a user.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use discovery_backend::domain::{
///     Email, PasswordHash, Role, SecureUser, Tier, User, UserId, UserRecord, Username,
/// };
///
/// let user = User::from(UserRecord {
///     id: UserId::random(),
///     email: Email::parse("a@x.com").unwrap(),
///     username: Username::parse("alice").unwrap(),
///     password_hash: PasswordHash::new("$argon2id$..."),
///     full_name: None,
///     institution: None,
///     tier: Tier::Free,
///     role: Role::Member,
///     is_active: true,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// });
/// let json = serde_json::to_value(SecureUser::from(&user)).unwrap();
/// assert!(json.get("passwordHash").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecureUser {
    pub id: UserId,
    pub email: Email,
    pub username: Username,
    pub full_name: Option<String>,
    pub institution: Option<String>,
    pub tier: Tier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for SecureUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().clone(),
            username: user.username().clone(),
            full_name: user.full_name().map(str::to_owned),
            institution: user.institution().map(str::to_owned),
            tier: user.tier(),
            is_active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

#[cfg(test)]
mod tests;
