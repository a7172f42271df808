//! Property predictions recorded against molecules.
//!
//! Payloads come from external prediction services and are stored as opaque
//! JSON. Only the envelope (category, confidence, model version) is
//! validated here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::validation::{ValidationCode, ValidationError, validate_range, validate_safe_name};
use super::{MoleculeId, PredictionId};

/// Model version recorded when the caller omits one.
pub const DEFAULT_MODEL_VERSION: &str = "unversioned";
/// Upper bound on the model version label.
pub const MODEL_VERSION_MAX: usize = 100;
/// Upper bound on predictions accepted by one bulk insert.
pub const MAX_BULK_PREDICTIONS: usize = 100;

/// Closed set of prediction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PredictionCategory {
    Admet,
    Toxicity,
    Solubility,
    Permeability,
    Metabolism,
    BindingAffinity,
    Structure,
}

impl PredictionCategory {
    /// Every category, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::Admet,
        Self::Toxicity,
        Self::Solubility,
        Self::Permeability,
        Self::Metabolism,
        Self::BindingAffinity,
        Self::Structure,
    ];

    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admet => "admet",
            Self::Toxicity => "toxicity",
            Self::Solubility => "solubility",
            Self::Permeability => "permeability",
            Self::Metabolism => "metabolism",
            Self::BindingAffinity => "binding_affinity",
            Self::Structure => "structure",
        }
    }
}

impl FromStr for PredictionCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s.trim())
            .ok_or(ValidationError::new("category", ValidationCode::UnknownValue))
    }
}

impl fmt::Display for PredictionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored prediction.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: PredictionId,
    pub molecule_id: MoleculeId,
    pub category: PredictionCategory,
    #[schema(value_type = Object)]
    pub payload: Value,
    pub confidence: Option<f64>,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

/// Validated prediction envelope, not yet bound to a molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionDraft {
    category: PredictionCategory,
    payload: Value,
    confidence: Option<f64>,
    model_version: String,
}

impl PredictionDraft {
    /// Validate a prediction envelope. The payload must be a JSON object.
    pub fn try_new(
        category: PredictionCategory,
        payload: Value,
        confidence: Option<f64>,
        model_version: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if !payload.is_object() {
            return Err(ValidationError::new("payload", ValidationCode::InvalidType));
        }
        let model_version = match model_version.map(str::trim) {
            None | Some("") => DEFAULT_MODEL_VERSION.to_owned(),
            Some(raw) => validate_safe_name("modelVersion", raw, MODEL_VERSION_MAX)?,
        };
        Ok(Self {
            category,
            payload,
            confidence: validate_range("confidence", confidence, 0.0, 1.0)?,
            model_version,
        })
    }

    /// Bind the draft to its molecule.
    #[must_use]
    pub fn for_molecule(self, molecule_id: MoleculeId) -> NewPrediction {
        NewPrediction {
            molecule_id,
            category: self.category,
            payload: self.payload,
            confidence: self.confidence,
            model_version: self.model_version,
        }
    }
}

/// Insert payload accepted by the prediction repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub molecule_id: MoleculeId,
    pub category: PredictionCategory,
    pub payload: Value,
    pub confidence: Option<f64>,
    pub model_version: String,
}

/// Newest prediction of each category recorded for one molecule, keyed by
/// category wire name. Categories with no prediction are absent.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSummary {
    pub molecule_id: MoleculeId,
    pub latest: BTreeMap<String, Prediction>,
}

impl PredictionSummary {
    /// Keep the first prediction seen per category; `predictions` must be
    /// ordered newest first.
    pub fn from_newest_first(
        molecule_id: MoleculeId,
        predictions: impl IntoIterator<Item = Prediction>,
    ) -> Self {
        let mut latest = BTreeMap::new();
        for prediction in predictions {
            latest
                .entry(prediction.category.as_str().to_owned())
                .or_insert(prediction);
        }
        Self {
            molecule_id,
            latest,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("admet", PredictionCategory::Admet)]
    #[case("binding_affinity", PredictionCategory::BindingAffinity)]
    fn categories_parse_from_wire_names(#[case] raw: &str, #[case] expected: PredictionCategory) {
        assert_eq!(raw.parse::<PredictionCategory>().expect("known"), expected);
    }

    #[rstest]
    fn unknown_categories_are_rejected() {
        let err = "docking".parse::<PredictionCategory>().expect_err("unknown");
        assert_eq!(err.code(), ValidationCode::UnknownValue);
    }

    #[rstest]
    #[case(Some(-0.1))]
    #[case(Some(1.01))]
    #[case(Some(f64::NAN))]
    fn confidence_must_lie_in_unit_interval(#[case] confidence: Option<f64>) {
        let err = PredictionDraft::try_new(
            PredictionCategory::Toxicity,
            json!({}),
            confidence,
            None,
        )
        .expect_err("out of range");
        assert_eq!(err.field(), "confidence");
    }

    #[rstest]
    fn payload_must_be_an_object() {
        let err = PredictionDraft::try_new(PredictionCategory::Admet, json!([1, 2]), None, None)
            .expect_err("array payload");
        assert_eq!(err.field(), "payload");
    }

    #[rstest]
    fn missing_model_version_uses_default() {
        let new = PredictionDraft::try_new(PredictionCategory::Admet, json!({"a": 1}), Some(0.5), None)
            .expect("valid")
            .for_molecule(MoleculeId::random());
        assert_eq!(new.model_version, DEFAULT_MODEL_VERSION);
    }

    fn stored(category: PredictionCategory, model_version: &str) -> Prediction {
        Prediction {
            id: PredictionId::random(),
            molecule_id: MoleculeId::random(),
            category,
            payload: json!({}),
            confidence: None,
            model_version: model_version.to_owned(),
            created_at: chrono::Utc::now(),
        }
    }

    #[rstest]
    fn summary_keeps_the_newest_per_category() {
        let molecule = MoleculeId::random();
        let summary = PredictionSummary::from_newest_first(
            molecule,
            [
                stored(PredictionCategory::Toxicity, "v3"),
                stored(PredictionCategory::Admet, "v2"),
                stored(PredictionCategory::Toxicity, "v1"),
            ],
        );

        assert_eq!(summary.molecule_id, molecule);
        assert_eq!(summary.latest.len(), 2);
        assert_eq!(summary.latest["toxicity"].model_version, "v3");
        assert_eq!(summary.latest["admet"].model_version, "v2");
    }
}
