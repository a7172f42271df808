//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations, plus the conversions back
//! into domain entities.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    ActivityAction, ActivityLogEntry, ActivityTarget, Email, MolecularProperties, Molecule,
    NewActivity, NewMolecule, NewPrediction, NewProject, NewUser, PasswordHash, Prediction,
    PredictionCategory, Project, ProjectChanges, Smiles, User, UserChanges, UserRecord, Username,
};

use super::schema::{activity_log, molecules, predictions, projects, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub institution: Option<String>,
    pub tier: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Rebuild the domain entity, rejecting values the domain cannot
    /// represent.
    pub(crate) fn into_domain(self) -> Result<User, String> {
        let bad = |column: &str| format!("users.{column} holds an invalid value for {}", self.id);
        Ok(User::from(UserRecord {
            id: self.id.into(),
            email: Email::parse(&self.email).map_err(|_| bad("email"))?,
            username: Username::parse(&self.username).map_err(|_| bad("username"))?,
            password_hash: PasswordHash::new(self.password_hash),
            full_name: self.full_name,
            institution: self.institution,
            tier: self.tier.parse().map_err(|_| bad("tier"))?,
            role: self.role.parse().map_err(|_| bad("role"))?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Insertable struct for creating user records. Tier, role, and activity
/// status take their column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub full_name: Option<&'a str>,
    pub institution: Option<&'a str>,
}

impl<'a> NewUserRow<'a> {
    pub(crate) fn new(id: Uuid, user: &'a NewUser) -> Self {
        Self {
            id,
            email: user.email.as_ref(),
            username: user.username.as_ref(),
            password_hash: user.password_hash.as_str(),
            full_name: user.full_name.as_deref(),
            institution: user.institution.as_deref(),
        }
    }
}

/// Changeset for user updates. Outer `None` leaves a column untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserUpdate<'a> {
    pub full_name: Option<Option<&'a str>>,
    pub institution: Option<Option<&'a str>>,
    pub tier: Option<&'static str>,
    pub is_active: Option<bool>,
}

impl<'a> From<&'a UserChanges> for UserUpdate<'a> {
    fn from(changes: &'a UserChanges) -> Self {
        Self {
            full_name: changes.full_name.as_ref().map(Option::as_deref),
            institution: changes.institution.as_ref().map(Option::as_deref),
            tier: changes.tier.map(|tier| tier.as_str()),
            is_active: changes.is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// Project models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub disease_target: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            name: row.name,
            description: row.description,
            disease_target: row.disease_target,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub(crate) struct NewProjectRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub disease_target: Option<&'a str>,
}

impl<'a> NewProjectRow<'a> {
    pub(crate) fn new(id: Uuid, project: &'a NewProject) -> Self {
        Self {
            id,
            user_id: *project.user_id.as_uuid(),
            name: project.name.as_str(),
            description: project.description.as_deref(),
            disease_target: project.disease_target.as_deref(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects)]
pub(crate) struct ProjectUpdate<'a> {
    pub name: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub disease_target: Option<Option<&'a str>>,
}

impl<'a> From<&'a ProjectChanges> for ProjectUpdate<'a> {
    fn from(changes: &'a ProjectChanges) -> Self {
        Self {
            name: changes.name.as_deref(),
            description: changes.description.as_ref().map(Option::as_deref),
            disease_target: changes.disease_target.as_ref().map(Option::as_deref),
        }
    }
}

// ---------------------------------------------------------------------------
// Molecule models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = molecules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MoleculeRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub smiles: String,
    pub name: Option<String>,
    pub generation_method: String,
    pub molecular_weight: Option<f64>,
    pub logp: Option<f64>,
    pub tpsa: Option<f64>,
    pub qed: Option<f64>,
    pub num_hbd: Option<i32>,
    pub num_hba: Option<i32>,
    pub num_rotatable_bonds: Option<i32>,
    pub num_aromatic_rings: Option<i32>,
    pub num_heavy_atoms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

fn count_from_db(value: Option<i32>) -> Option<u32> {
    value.and_then(|count| u32::try_from(count).ok())
}

fn count_for_db(value: Option<u32>) -> Option<i32> {
    value.and_then(|count| i32::try_from(count).ok())
}

impl MoleculeRow {
    pub(crate) fn into_domain(self) -> Result<Molecule, String> {
        let smiles = Smiles::parse(&self.smiles)
            .map_err(|_| format!("molecules.smiles holds an invalid value for {}", self.id))?;
        Ok(Molecule {
            id: self.id.into(),
            project_id: self.project_id.into(),
            user_id: self.user_id.into(),
            smiles,
            name: self.name,
            generation_method: self.generation_method,
            properties: MolecularProperties {
                molecular_weight: self.molecular_weight,
                logp: self.logp,
                tpsa: self.tpsa,
                qed: self.qed,
                num_hbd: count_from_db(self.num_hbd),
                num_hba: count_from_db(self.num_hba),
                num_rotatable_bonds: count_from_db(self.num_rotatable_bonds),
                num_aromatic_rings: count_from_db(self.num_aromatic_rings),
                num_heavy_atoms: count_from_db(self.num_heavy_atoms),
            },
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = molecules)]
pub(crate) struct NewMoleculeRow<'a> {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub smiles: &'a str,
    pub name: Option<&'a str>,
    pub generation_method: &'a str,
    pub molecular_weight: Option<f64>,
    pub logp: Option<f64>,
    pub tpsa: Option<f64>,
    pub qed: Option<f64>,
    pub num_hbd: Option<i32>,
    pub num_hba: Option<i32>,
    pub num_rotatable_bonds: Option<i32>,
    pub num_aromatic_rings: Option<i32>,
    pub num_heavy_atoms: Option<i32>,
}

impl<'a> From<&'a NewMolecule> for NewMoleculeRow<'a> {
    fn from(molecule: &'a NewMolecule) -> Self {
        let props = &molecule.properties;
        Self {
            id: Uuid::new_v4(),
            project_id: *molecule.project_id.as_uuid(),
            user_id: *molecule.user_id.as_uuid(),
            smiles: molecule.smiles.as_ref(),
            name: molecule.name.as_deref(),
            generation_method: molecule.generation_method.as_str(),
            molecular_weight: props.molecular_weight,
            logp: props.logp,
            tpsa: props.tpsa,
            qed: props.qed,
            num_hbd: count_for_db(props.num_hbd),
            num_hba: count_for_db(props.num_hba),
            num_rotatable_bonds: count_for_db(props.num_rotatable_bonds),
            num_aromatic_rings: count_for_db(props.num_aromatic_rings),
            num_heavy_atoms: count_for_db(props.num_heavy_atoms),
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = predictions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PredictionRow {
    pub id: Uuid,
    pub molecule_id: Uuid,
    pub category: String,
    pub payload: serde_json::Value,
    pub confidence: Option<f64>,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

impl PredictionRow {
    pub(crate) fn into_domain(self) -> Result<Prediction, String> {
        let category = PredictionCategory::from_str(&self.category).map_err(|_| {
            format!("predictions.category holds an invalid value for {}", self.id)
        })?;
        Ok(Prediction {
            id: self.id.into(),
            molecule_id: self.molecule_id.into(),
            category,
            payload: self.payload,
            confidence: self.confidence,
            model_version: self.model_version,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = predictions)]
pub(crate) struct NewPredictionRow<'a> {
    pub id: Uuid,
    pub molecule_id: Uuid,
    pub category: &'static str,
    pub payload: &'a serde_json::Value,
    pub confidence: Option<f64>,
    pub model_version: &'a str,
}

impl<'a> From<&'a NewPrediction> for NewPredictionRow<'a> {
    fn from(prediction: &'a NewPrediction) -> Self {
        Self {
            id: Uuid::new_v4(),
            molecule_id: *prediction.molecule_id.as_uuid(),
            category: prediction.category.as_str(),
            payload: &prediction.payload,
            confidence: prediction.confidence,
            model_version: prediction.model_version.as_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// Activity log models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = activity_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ActivityRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub target_kind: Option<String>,
    pub target_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ActivityRow {
    pub(crate) fn into_domain(self) -> Result<ActivityLogEntry, String> {
        let bad = |column: &str| {
            format!("activity_log.{column} holds an invalid value for {}", self.id)
        };
        let action = ActivityAction::from_str(&self.action).map_err(|_| bad("action"))?;
        let target = match (self.target_kind.as_deref(), self.target_id) {
            (Some(kind), Some(id)) => {
                Some(ActivityTarget::from_parts(kind, id).map_err(|_| bad("target_kind"))?)
            }
            _ => None,
        };
        Ok(ActivityLogEntry {
            id: self.id.into(),
            user_id: self.user_id.into(),
            action,
            target,
            details: self.details,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activity_log)]
pub(crate) struct NewActivityRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: &'static str,
    pub target_kind: Option<&'static str>,
    pub target_id: Option<Uuid>,
    pub details: Option<&'a serde_json::Value>,
}

impl<'a> From<&'a NewActivity> for NewActivityRow<'a> {
    fn from(entry: &'a NewActivity) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: *entry.user_id.as_uuid(),
            action: entry.action.as_str(),
            target_kind: entry.target.as_ref().map(ActivityTarget::kind),
            target_id: entry.target.as_ref().map(ActivityTarget::id),
            details: entry.details.as_ref(),
        }
    }
}
