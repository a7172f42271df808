//! Research projects: the top-level owned resource.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::validation::{
    DESCRIPTION_MAX, LABEL_MAX, ValidationCode, ValidationError, validate_optional_text,
    validate_safe_name,
};
use super::{ProjectId, UserId};

/// Stored research project.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    /// Owning user.
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub disease_target: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Copy of this project with `changes` applied in memory.
    #[must_use]
    pub fn with_changes(&self, changes: &ProjectChanges) -> Self {
        let mut next = self.clone();
        if let Some(name) = &changes.name {
            next.name.clone_from(name);
        }
        if let Some(description) = &changes.description {
            next.description.clone_from(description);
        }
        if let Some(disease_target) = &changes.disease_target {
            next.disease_target.clone_from(disease_target);
        }
        next
    }
}

/// Validated project attributes supplied by a caller, without an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    name: String,
    description: Option<String>,
    disease_target: Option<String>,
}

impl ProjectDraft {
    /// Validate caller-supplied project attributes.
    ///
    /// # Examples
    /// ```
    /// use discovery_backend::domain::ProjectDraft;
    ///
    /// assert!(ProjectDraft::try_new("Kinase screen", None, Some("NSCLC")).is_ok());
    /// assert!(ProjectDraft::try_new("<b>x</b>", None, None).is_err());
    /// ```
    pub fn try_new(
        name: &str,
        description: Option<&str>,
        disease_target: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validate_safe_name("name", name, LABEL_MAX)?,
            description: validate_optional_text("description", description, DESCRIPTION_MAX)?,
            disease_target: validate_optional_text("diseaseTarget", disease_target, LABEL_MAX)?,
        })
    }

    /// Attach the owner resolved from the authenticated actor.
    #[must_use]
    pub fn owned_by(self, user_id: UserId) -> NewProject {
        NewProject {
            user_id,
            name: self.name,
            description: self.description,
            disease_target: self.disease_target,
        }
    }
}

/// Insert payload accepted by the project repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub disease_target: Option<String>,
}

/// Whitelisted project mutation. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub disease_target: Option<Option<String>>,
}

impl ProjectChanges {
    /// True when no column would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.disease_target.is_none()
    }
}

/// Default number of projects returned by a listing.
pub const DEFAULT_PROJECT_LIMIT: u32 = 100;
/// Upper bound on projects returned by a listing.
pub const MAX_PROJECT_LIMIT: u32 = 200;

/// Owner-scoped project listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Case-insensitive substring match on the name.
    pub name_contains: Option<String>,
    pub limit: u32,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self {
            name_contains: None,
            limit: DEFAULT_PROJECT_LIMIT,
        }
    }
}

impl ProjectFilter {
    /// Validate caller-supplied listing parameters, applying defaults.
    pub fn try_new(name_contains: Option<&str>, limit: Option<u32>) -> Result<Self, ValidationError> {
        let limit = limit.unwrap_or(DEFAULT_PROJECT_LIMIT);
        if limit == 0 || limit > MAX_PROJECT_LIMIT {
            return Err(ValidationError::new("limit", ValidationCode::OutOfRange));
        }
        Ok(Self {
            name_contains: validate_optional_text("q", name_contains, LABEL_MAX)?,
            limit,
        })
    }
}
