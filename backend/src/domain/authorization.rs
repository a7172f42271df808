//! Ownership checks and whitelisted field mutation.
//!
//! Every owned lookup in a domain service is followed by
//! [`check_ownership`] (or [`require_admin`] for administrative operations).
//! The repository-local architecture lint fails the build when a service
//! function fetches an owned resource without one of these calls.
//!
//! Updates arrive as a JSON object. [`apply_whitelisted_update`] compares the
//! requested keys against the closed whitelist for the caller's role and
//! rejects the whole request when any key falls outside it. Accepted keys are
//! parsed into a typed command, which is the only input repositories accept.

use std::fmt;

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::validation::{
    DESCRIPTION_MAX, LABEL_MAX, ValidationCode, ValidationError, validate_optional_text,
    validate_safe_name,
};
use super::{
    Actor, AdminUserChanges, Error, Molecule, ProfileChanges, Project, ProjectChanges, Role, Tier,
    TierChange, User, UserChanges, UserId,
};

/// Message returned for every authorization failure.
pub const ACCESS_DENIED: &str = "access denied";

/// Resource with a single owning user.
pub trait Owned {
    /// Identifier of the owning user.
    fn owner_id(&self) -> UserId;
}

impl Owned for Project {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for Molecule {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for User {
    fn owner_id(&self) -> UserId {
        self.id()
    }
}

/// Permit the operation only when `actor` owns `resource` or is an admin.
///
/// The failure carries no hint about the actual owner.
///
/// # Examples
/// ```
/// use discovery_backend::domain::authorization::{check_ownership, Owned};
/// use discovery_backend::domain::{Actor, Role, Tier, UserId};
///
/// struct Note(UserId);
/// impl Owned for Note {
///     fn owner_id(&self) -> UserId { self.0 }
/// }
///
/// let owner = UserId::random();
/// let actor = Actor { user_id: owner, role: Role::Member, tier: Tier::Free };
/// assert!(check_ownership(&Note(owner), &actor).is_ok());
/// assert!(check_ownership(&Note(UserId::random()), &actor).is_err());
/// ```
pub fn check_ownership<R>(resource: &R, actor: &Actor) -> Result<(), Error>
where
    R: Owned + ?Sized,
{
    if resource.owner_id() == actor.user_id {
        return Ok(());
    }
    if actor.is_admin() {
        debug!(actor = %actor.user_id, "administrative override of ownership check");
        return Ok(());
    }
    Err(Error::forbidden(ACCESS_DENIED))
}

/// Permit the operation only for administrative actors.
pub fn require_admin(actor: &Actor) -> Result<(), Error> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden(ACCESS_DENIED))
    }
}

/// Closed, typed mutation for one entity type.
pub trait UpdateCommand: Sized {
    /// Entity the command mutates.
    type Entity;

    /// Wire field names `role` may write. Anything else is rejected.
    fn whitelist(role: Role) -> &'static [&'static str];

    /// Parse fields that already passed the whitelist check.
    fn parse(fields: &Map<String, Value>) -> Result<Self, ValidationError>;

    /// The entity as it would look after the command is applied.
    fn apply(&self, entity: &Self::Entity) -> Self::Entity;

    /// True when the command writes nothing.
    fn is_empty(&self) -> bool;
}

/// Outcome of a successful whitelist check.
pub struct Whitelisted<C: UpdateCommand> {
    /// Typed changes to hand to the repository.
    pub changes: C,
    /// Entity with the changes applied in memory.
    pub preview: C::Entity,
}

impl<C> fmt::Debug for Whitelisted<C>
where
    C: UpdateCommand + fmt::Debug,
    C::Entity: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Whitelisted")
            .field("changes", &self.changes)
            .field("preview", &self.preview)
            .finish()
    }
}

/// Reject `requested` outright if it names any field outside the whitelist
/// for `role`; otherwise parse it into the typed command `C`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use discovery_backend::domain::authorization::apply_whitelisted_update;
/// use discovery_backend::domain::{ErrorCode, Project, ProjectChanges, ProjectId, Role, UserId};
/// use serde_json::json;
///
/// let project = Project {
///     id: ProjectId::random(),
///     user_id: UserId::random(),
///     name: "p".into(),
///     description: None,
///     disease_target: None,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
/// let body = json!({ "name": "renamed", "ownerId": UserId::random() });
/// let err = apply_whitelisted_update::<ProjectChanges>(
///     Role::Member,
///     body.as_object().unwrap(),
///     &project,
/// )
/// .err()
/// .unwrap();
/// assert_eq!(err.code(), ErrorCode::Forbidden);
/// ```
pub fn apply_whitelisted_update<C>(
    role: Role,
    requested: &Map<String, Value>,
    entity: &C::Entity,
) -> Result<Whitelisted<C>, Error>
where
    C: UpdateCommand,
{
    let allowed = C::whitelist(role);
    let mut rejected: Vec<&str> = requested
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect();
    if !rejected.is_empty() {
        rejected.sort_unstable();
        warn!(?rejected, role = role.as_str(), "update rejected: fields outside whitelist");
        return Err(Error::forbidden(ACCESS_DENIED).with_details(json!({
            "rejectedFields": rejected,
        })));
    }

    let changes = C::parse(requested)?;
    let preview = changes.apply(entity);
    Ok(Whitelisted { changes, preview })
}

const PROJECT_FIELDS: &[&str] = &["name", "description", "diseaseTarget"];
const PROFILE_FIELDS: &[&str] = &["fullName", "institution"];
const ADMIN_USER_FIELDS: &[&str] = &["fullName", "institution", "tier", "isActive"];
const TIER_FIELDS: &[&str] = &["tier"];

impl UpdateCommand for ProjectChanges {
    type Entity = Project;

    fn whitelist(_role: Role) -> &'static [&'static str] {
        PROJECT_FIELDS
    }

    fn parse(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        Ok(Self {
            name: label_field(fields, "name", LABEL_MAX)?,
            description: nullable_text_field(fields, "description", DESCRIPTION_MAX)?,
            disease_target: nullable_text_field(fields, "diseaseTarget", LABEL_MAX)?,
        })
    }

    fn apply(&self, entity: &Project) -> Project {
        entity.with_changes(self)
    }

    fn is_empty(&self) -> bool {
        ProjectChanges::is_empty(self)
    }
}

impl UpdateCommand for ProfileChanges {
    type Entity = User;

    fn whitelist(_role: Role) -> &'static [&'static str] {
        PROFILE_FIELDS
    }

    fn parse(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        Ok(Self {
            full_name: nullable_text_field(fields, "fullName", LABEL_MAX)?,
            institution: nullable_text_field(fields, "institution", LABEL_MAX)?,
        })
    }

    fn apply(&self, entity: &User) -> User {
        entity.with_changes(&UserChanges::from(self.clone()))
    }

    fn is_empty(&self) -> bool {
        UserChanges::from(self.clone()).is_empty()
    }
}

impl UpdateCommand for AdminUserChanges {
    type Entity = User;

    fn whitelist(role: Role) -> &'static [&'static str] {
        match role {
            Role::Admin => ADMIN_USER_FIELDS,
            Role::Member => &[],
        }
    }

    fn parse(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        Ok(Self {
            full_name: nullable_text_field(fields, "fullName", LABEL_MAX)?,
            institution: nullable_text_field(fields, "institution", LABEL_MAX)?,
            tier: tier_field(fields)?,
            is_active: bool_field(fields, "isActive")?,
        })
    }

    fn apply(&self, entity: &User) -> User {
        entity.with_changes(&UserChanges::from(self.clone()))
    }

    fn is_empty(&self) -> bool {
        UserChanges::from(self.clone()).is_empty()
    }
}

impl UpdateCommand for TierChange {
    type Entity = User;

    fn whitelist(role: Role) -> &'static [&'static str] {
        match role {
            Role::Admin => TIER_FIELDS,
            Role::Member => &[],
        }
    }

    fn parse(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let tier = tier_field(fields)?;
        if tier.is_none() {
            return Err(ValidationError::new("tier", ValidationCode::Required));
        }
        Ok(Self { tier })
    }

    fn apply(&self, entity: &User) -> User {
        entity.with_changes(&UserChanges::from(*self))
    }

    fn is_empty(&self) -> bool {
        self.tier.is_none()
    }
}

/// Absent: untouched. Null or blank: cleared. String: validated free text.
fn nullable_text_field(
    fields: &Map<String, Value>,
    key: &'static str,
    max: usize,
) -> Result<Option<Option<String>>, ValidationError> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(raw)) => validate_optional_text(key, Some(raw), max).map(Some),
        Some(_) => Err(ValidationError::new(key, ValidationCode::InvalidType)),
    }
}

/// Absent: untouched. String: validated label. Null is not permitted.
fn label_field(
    fields: &Map<String, Value>,
    key: &'static str,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::Null) => Err(ValidationError::new(key, ValidationCode::Required)),
        Some(Value::String(raw)) => validate_safe_name(key, raw, max).map(Some),
        Some(_) => Err(ValidationError::new(key, ValidationCode::InvalidType)),
    }
}

fn tier_field(fields: &Map<String, Value>) -> Result<Option<Tier>, ValidationError> {
    match fields.get("tier") {
        None => Ok(None),
        Some(Value::String(raw)) => raw.parse().map(Some),
        Some(Value::Null) => Err(ValidationError::new("tier", ValidationCode::Required)),
        Some(_) => Err(ValidationError::new("tier", ValidationCode::InvalidType)),
    }
}

fn bool_field(fields: &Map<String, Value>, key: &'static str) -> Result<Option<bool>, ValidationError> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(ValidationError::new(key, ValidationCode::InvalidType)),
    }
}
