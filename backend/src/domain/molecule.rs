//! Molecules, their derived properties, and owner-scoped search filters.
//!
//! Molecules are immutable once stored. The owning user is denormalised onto
//! every row so ownership checks and searches never need to join through the
//! project.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{
    LABEL_MAX, ValidationCode, ValidationError, validate_optional_text, validate_range,
    validate_safe_name, validate_smiles,
};
use super::{MoleculeId, ProjectId, UserId};

/// Generation method recorded when the caller omits one.
pub const DEFAULT_GENERATION_METHOD: &str = "manual";
/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;
/// Upper bound on search results.
pub const MAX_SEARCH_LIMIT: u32 = 200;
/// Default page size when listing a project's molecules.
pub const DEFAULT_LIST_LIMIT: u32 = 100;
/// Upper bound on molecules accepted by one bulk insert.
pub const MAX_BULK_MOLECULES: usize = 1000;
/// Upper bound for integer descriptor counts such as heavy atoms.
pub const DESCRIPTOR_COUNT_MAX: u32 = 10_000;

const GENERATION_METHOD_MAX: usize = 50;

/// Syntactically valid SMILES structure string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "CC(=O)Oc1ccccc1C(=O)O")]
pub struct Smiles(String);

impl Smiles {
    /// Validate a structure string.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_smiles(raw).map(Self)
    }
}

impl AsRef<str> for Smiles {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Smiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptor values computed upstream and stored alongside the structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MolecularProperties {
    pub molecular_weight: Option<f64>,
    pub logp: Option<f64>,
    pub tpsa: Option<f64>,
    pub qed: Option<f64>,
    pub num_hbd: Option<u32>,
    pub num_hba: Option<u32>,
    pub num_rotatable_bonds: Option<u32>,
    pub num_aromatic_rings: Option<u32>,
    pub num_heavy_atoms: Option<u32>,
}

impl MolecularProperties {
    /// Reject non-finite or physically implausible descriptor values.
    pub fn validate(self) -> Result<Self, ValidationError> {
        validate_range("molecularWeight", self.molecular_weight, 0.0, 5000.0)?;
        validate_range("logp", self.logp, -20.0, 20.0)?;
        validate_range("tpsa", self.tpsa, 0.0, 1000.0)?;
        validate_range("qed", self.qed, 0.0, 1.0)?;
        let counts = [
            ("numHbd", self.num_hbd),
            ("numHba", self.num_hba),
            ("numRotatableBonds", self.num_rotatable_bonds),
            ("numAromaticRings", self.num_aromatic_rings),
            ("numHeavyAtoms", self.num_heavy_atoms),
        ];
        if let Some((field, _)) = counts
            .into_iter()
            .find(|(_, value)| value.is_some_and(|count| count > DESCRIPTOR_COUNT_MAX))
        {
            return Err(ValidationError::new(field, ValidationCode::OutOfRange));
        }
        Ok(self)
    }
}

/// Stored molecule.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Molecule {
    pub id: MoleculeId,
    pub project_id: ProjectId,
    /// Owning user, copied from the project at insert time.
    pub user_id: UserId,
    pub smiles: Smiles,
    pub name: Option<String>,
    pub generation_method: String,
    #[serde(flatten)]
    pub properties: MolecularProperties,
    pub created_at: DateTime<Utc>,
}

/// Validated molecule attributes supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeDraft {
    smiles: Smiles,
    name: Option<String>,
    generation_method: String,
    properties: MolecularProperties,
}

impl MoleculeDraft {
    /// Validate caller-supplied molecule attributes.
    pub fn try_new(
        smiles: &str,
        name: Option<&str>,
        generation_method: Option<&str>,
        properties: MolecularProperties,
    ) -> Result<Self, ValidationError> {
        let generation_method = match generation_method.map(str::trim) {
            None | Some("") => DEFAULT_GENERATION_METHOD.to_owned(),
            Some(raw) => validate_safe_name("generationMethod", raw, GENERATION_METHOD_MAX)?,
        };
        Ok(Self {
            smiles: Smiles::parse(smiles)?,
            name: validate_optional_text("name", name, LABEL_MAX)?,
            generation_method,
            properties: properties.validate()?,
        })
    }

    pub fn smiles(&self) -> &Smiles {
        &self.smiles
    }

    /// Bind the draft to a project and its owner.
    #[must_use]
    pub fn into_new(self, project_id: ProjectId, user_id: UserId) -> NewMolecule {
        NewMolecule {
            project_id,
            user_id,
            smiles: self.smiles,
            name: self.name,
            generation_method: self.generation_method,
            properties: self.properties,
        }
    }
}

/// Insert payload accepted by the molecule repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMolecule {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub smiles: Smiles,
    pub name: Option<String>,
    pub generation_method: String,
    pub properties: MolecularProperties,
}

/// Owner-scoped property filters for molecule search.
///
/// The owner is never part of the filter: repositories take it as a separate
/// argument so a caller cannot widen the search to another user.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeFilter {
    pub min_molecular_weight: Option<f64>,
    pub max_molecular_weight: Option<f64>,
    pub min_logp: Option<f64>,
    pub max_logp: Option<f64>,
    pub min_qed: Option<f64>,
    pub max_qed: Option<f64>,
    pub generation_method: Option<String>,
    pub limit: u32,
}

impl Default for MoleculeFilter {
    fn default() -> Self {
        Self {
            min_molecular_weight: None,
            max_molecular_weight: None,
            min_logp: None,
            max_logp: None,
            min_qed: None,
            max_qed: None,
            generation_method: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl MoleculeFilter {
    /// Check bounds, ordering of each min/max pair, and the result limit.
    ///
    /// # Examples
    /// ```
    /// use discovery_backend::domain::MoleculeFilter;
    ///
    /// let filter = MoleculeFilter { min_qed: Some(0.9), max_qed: Some(0.1), ..Default::default() };
    /// assert!(filter.validate().is_err());
    /// ```
    pub fn validate(self) -> Result<Self, ValidationError> {
        validate_range("minMolecularWeight", self.min_molecular_weight, 0.0, 5000.0)?;
        validate_range("maxMolecularWeight", self.max_molecular_weight, 0.0, 5000.0)?;
        validate_range("minLogp", self.min_logp, -20.0, 20.0)?;
        validate_range("maxLogp", self.max_logp, -20.0, 20.0)?;
        validate_range("minQed", self.min_qed, 0.0, 1.0)?;
        validate_range("maxQed", self.max_qed, 0.0, 1.0)?;
        ordered("maxMolecularWeight", self.min_molecular_weight, self.max_molecular_weight)?;
        ordered("maxLogp", self.min_logp, self.max_logp)?;
        ordered("maxQed", self.min_qed, self.max_qed)?;
        if self.limit == 0 || self.limit > MAX_SEARCH_LIMIT {
            return Err(ValidationError::new("limit", ValidationCode::OutOfRange));
        }
        let generation_method = self
            .generation_method
            .as_deref()
            .map(|raw| validate_safe_name("generationMethod", raw, GENERATION_METHOD_MAX))
            .transpose()?;
        Ok(Self {
            generation_method,
            ..self
        })
    }
}

fn ordered(field: &'static str, min: Option<f64>, max: Option<f64>) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(low), Some(high)) if low > high => {
            Err(ValidationError::new(field, ValidationCode::OutOfRange))
        }
        _ => Ok(()),
    }
}

/// Paging window for listing a project's molecules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Validate caller-supplied paging, applying defaults.
    pub fn try_new(limit: Option<u32>, offset: Option<u32>) -> Result<Self, ValidationError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if limit == 0 || limit > MAX_SEARCH_LIMIT {
            return Err(ValidationError::new("limit", ValidationCode::OutOfRange));
        }
        Ok(Self {
            limit,
            offset: offset.unwrap_or(0),
        })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// Aggregate descriptors for the molecules of one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoleculeStatistics {
    pub total_count: i64,
    pub avg_molecular_weight: Option<f64>,
    pub avg_logp: Option<f64>,
    pub avg_qed: Option<f64>,
    /// Molecule counts keyed by generation method.
    pub generation_methods: BTreeMap<String, i64>,
}
