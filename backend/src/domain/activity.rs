//! Append-only audit trail of user actions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::validation::{ValidationCode, ValidationError};
use super::{ActivityId, MoleculeId, ProjectId, UserId};

/// Default number of entries returned by an activity listing.
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 50;
/// Upper bound for an activity listing.
pub const MAX_ACTIVITY_LIMIT: u32 = 200;

/// Closed set of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Registered,
    LoggedIn,
    ProfileUpdated,
    UserUpdated,
    TierChanged,
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    MoleculesCreated,
    MoleculeDeleted,
    PredictionsRecorded,
}

impl ActivityAction {
    const ALL: [Self; 11] = [
        Self::Registered,
        Self::LoggedIn,
        Self::ProfileUpdated,
        Self::UserUpdated,
        Self::TierChanged,
        Self::ProjectCreated,
        Self::ProjectUpdated,
        Self::ProjectDeleted,
        Self::MoleculesCreated,
        Self::MoleculeDeleted,
        Self::PredictionsRecorded,
    ];

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::LoggedIn => "logged_in",
            Self::ProfileUpdated => "profile_updated",
            Self::UserUpdated => "user_updated",
            Self::TierChanged => "tier_changed",
            Self::ProjectCreated => "project_created",
            Self::ProjectUpdated => "project_updated",
            Self::ProjectDeleted => "project_deleted",
            Self::MoleculesCreated => "molecules_created",
            Self::MoleculeDeleted => "molecule_deleted",
            Self::PredictionsRecorded => "predictions_recorded",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or(ValidationError::new("action", ValidationCode::UnknownValue))
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource an action was performed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActivityTarget {
    User(UserId),
    Project(ProjectId),
    Molecule(MoleculeId),
}

impl ActivityTarget {
    /// Storage discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Project(_) => "project",
            Self::Molecule(_) => "molecule",
        }
    }

    /// Raw identifier of the target.
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) => *id.as_uuid(),
            Self::Project(id) => *id.as_uuid(),
            Self::Molecule(id) => *id.as_uuid(),
        }
    }

    /// Rebuild a target from its stored discriminator and identifier.
    pub fn from_parts(kind: &str, id: Uuid) -> Result<Self, ValidationError> {
        match kind {
            "user" => Ok(Self::User(id.into())),
            "project" => Ok(Self::Project(id.into())),
            "molecule" => Ok(Self::Molecule(id.into())),
            _ => Err(ValidationError::new("target", ValidationCode::UnknownValue)),
        }
    }
}

/// Stored audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: ActivityId,
    /// Acting user.
    pub user_id: UserId,
    pub action: ActivityAction,
    pub target: Option<ActivityTarget>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Entry to append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub user_id: UserId,
    pub action: ActivityAction,
    pub target: Option<ActivityTarget>,
    pub details: Option<Value>,
}

impl NewActivity {
    /// Entry without details.
    #[must_use]
    pub fn new(user_id: UserId, action: ActivityAction, target: Option<ActivityTarget>) -> Self {
        Self {
            user_id,
            action,
            target,
            details: None,
        }
    }

    /// Attach action-specific metadata.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn actions_round_trip_through_storage_names() {
        for action in ActivityAction::ALL {
            assert_eq!(action.as_str().parse::<ActivityAction>(), Ok(action));
        }
    }

    #[rstest]
    fn targets_serialise_with_kind_and_id() {
        let id = ProjectId::random();
        let value = serde_json::to_value(ActivityTarget::Project(id)).expect("serialise");
        assert_eq!(value["kind"], "project");
        assert_eq!(value["id"], id.to_string());
    }

    #[rstest]
    fn unknown_target_kinds_are_rejected() {
        assert!(ActivityTarget::from_parts("route", Uuid::nil()).is_err());
    }
}
