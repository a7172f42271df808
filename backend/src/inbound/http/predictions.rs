//! Prediction API handlers.
//!
//! ```text
//! POST /api/v1/molecules/{id}/predictions {"predictions":[{"category":"toxicity","payload":{"herg":0.2}}]}
//! GET /api/v1/molecules/{id}/predictions?category=toxicity
//! GET /api/v1/molecules/{id}/predictions/latest?category=toxicity
//! GET /api/v1/molecules/{id}/predictions/summary
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::validation::ValidationError;
use crate::domain::{
    Error, MoleculeId, Prediction, PredictionCategory, PredictionDraft, PredictionSummary,
    RateClass,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, indexed, parse_id};
use crate::middleware::RateLimit;

const MOLECULE_ID: FieldName = FieldName::new("moleculeId");

/// One prediction as supplied by a model runner.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInput {
    /// One of `admet`, `toxicity`, `solubility`, `permeability`,
    /// `metabolism`, `binding_affinity`, `structure`.
    pub category: String,
    /// Model output; must be a JSON object.
    #[schema(value_type = Object)]
    pub payload: Value,
    pub confidence: Option<f64>,
    pub model_version: Option<String>,
}

impl PredictionInput {
    fn into_draft(self) -> Result<PredictionDraft, ValidationError> {
        let category: PredictionCategory = self.category.parse()?;
        PredictionDraft::try_new(
            category,
            self.payload,
            self.confidence,
            self.model_version.as_deref(),
        )
    }
}

/// Body of `POST /api/v1/molecules/{id}/predictions`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecordPredictionsRequest {
    pub predictions: Vec<PredictionInput>,
}

/// Category filter for prediction reads.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryParams {
    pub category: Option<String>,
}

fn parse_category(raw: Option<&str>) -> Result<Option<PredictionCategory>, Error> {
    raw.map(str::parse::<PredictionCategory>)
        .transpose()
        .map_err(Error::from)
}

/// Record predictions for a molecule the caller owns, atomically.
#[utoipa::path(
    post,
    path = "/api/v1/molecules/{id}/predictions",
    params(("id" = String, Path, description = "Molecule identifier")),
    request_body = RecordPredictionsRequest,
    responses(
        (status = 201, description = "Predictions recorded", body = [Prediction]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Molecule owned by another user", body = Error),
        (status = 404, description = "Molecule not found", body = Error),
        (status = 409, description = "Duplicate model version for a category", body = Error)
    ),
    tags = ["predictions"],
    operation_id = "recordPredictions"
)]
#[post("/molecules/{id}/predictions", wrap = "RateLimit::new(RateClass::Create)")]
pub async fn record_predictions(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<RecordPredictionsRequest>,
) -> ApiResult<HttpResponse> {
    let id: MoleculeId = parse_id(&path, MOLECULE_ID)?;
    let drafts = payload
        .into_inner()
        .predictions
        .into_iter()
        .enumerate()
        .map(|(index, input)| input.into_draft().map_err(|err| indexed(index, err)))
        .collect::<Result<Vec<_>, _>>()?;
    let stored = state.predictions.record(auth.actor(), &id, drafts).await?;
    Ok(HttpResponse::Created().json(stored))
}

/// Predictions for a molecule, newest first, optionally for one category.
#[utoipa::path(
    get,
    path = "/api/v1/molecules/{id}/predictions",
    params(("id" = String, Path, description = "Molecule identifier"), CategoryParams),
    responses(
        (status = 200, description = "Predictions", body = [Prediction]),
        (status = 400, description = "Unknown category", body = Error),
        (status = 403, description = "Molecule owned by another user", body = Error),
        (status = 404, description = "Molecule not found", body = Error)
    ),
    tags = ["predictions"],
    operation_id = "listPredictions"
)]
#[get("/molecules/{id}/predictions", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn list_predictions(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    params: web::Query<CategoryParams>,
) -> ApiResult<web::Json<Vec<Prediction>>> {
    let id: MoleculeId = parse_id(&path, MOLECULE_ID)?;
    let category = parse_category(params.category.as_deref())?;
    let predictions = state
        .predictions_query
        .list(auth.actor(), &id, category)
        .await?;
    Ok(web::Json(predictions))
}

/// Newest prediction of one category.
#[utoipa::path(
    get,
    path = "/api/v1/molecules/{id}/predictions/latest",
    params(("id" = String, Path, description = "Molecule identifier"), CategoryParams),
    responses(
        (status = 200, description = "Prediction", body = Prediction),
        (status = 400, description = "Missing or unknown category", body = Error),
        (status = 404, description = "No prediction recorded", body = Error)
    ),
    tags = ["predictions"],
    operation_id = "latestPrediction"
)]
#[get("/molecules/{id}/predictions/latest", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn latest_prediction(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    params: web::Query<CategoryParams>,
) -> ApiResult<web::Json<Prediction>> {
    let id: MoleculeId = parse_id(&path, MOLECULE_ID)?;
    let category = parse_category(params.category.as_deref())?.ok_or_else(|| {
        Error::invalid_request("category is required")
            .with_details(json!({ "field": "category", "code": "required" }))
    })?;
    let prediction = state
        .predictions_query
        .latest(auth.actor(), &id, category)
        .await?;
    Ok(web::Json(prediction))
}

/// Newest prediction of every recorded category, keyed by category.
#[utoipa::path(
    get,
    path = "/api/v1/molecules/{id}/predictions/summary",
    params(("id" = String, Path, description = "Molecule identifier")),
    responses(
        (status = 200, description = "Latest prediction per category", body = PredictionSummary),
        (status = 403, description = "Molecule owned by another user", body = Error),
        (status = 404, description = "Molecule not found", body = Error)
    ),
    tags = ["predictions"],
    operation_id = "predictionSummary"
)]
#[get("/molecules/{id}/predictions/summary", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn prediction_summary(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<PredictionSummary>> {
    let id: MoleculeId = parse_id(&path, MOLECULE_ID)?;
    let summary = state.predictions_query.summary(auth.actor(), &id).await?;
    Ok(web::Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockAccountQuery, MockPredictionCommand, MockPredictionQuery};
    use crate::domain::{Actor, PredictionId, Role, Tier, UserId};
    use crate::inbound::http::test_utils::{MockPorts, api_app, permissive_limiter};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test;
    use chrono::Utc;
    use rstest::rstest;

    fn signed_in() -> MockAccountQuery {
        let caller = Actor {
            user_id: UserId::random(),
            role: Role::Member,
            tier: Tier::Enterprise,
        };
        let mut query = MockAccountQuery::new();
        query.expect_resolve_actor().returning(move |_| Ok(caller));
        query
    }

    fn prediction(category: PredictionCategory) -> Prediction {
        Prediction {
            id: PredictionId::random(),
            molecule_id: MoleculeId::random(),
            category,
            payload: json!({"herg": 0.2}),
            confidence: Some(0.9),
            model_version: "v1".to_owned(),
            created_at: Utc::now(),
        }
    }

    async fn send(ports: MockPorts, req: test::TestRequest) -> (StatusCode, Value) {
        let app = test::init_service(api_app(ports.into_state(permissive_limiter()))).await;
        let res = test::call_service(
            &app,
            req.insert_header((AUTHORIZATION, "Bearer token"))
                .to_request(),
        )
        .await;
        let status = res.status();
        let body = test::read_body(res).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[actix_web::test]
    async fn records_a_batch() {
        let mut predictions = MockPredictionCommand::new();
        predictions
            .expect_record()
            .withf(|_, _, drafts| drafts.len() == 2)
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    prediction(PredictionCategory::Toxicity),
                    prediction(PredictionCategory::Solubility),
                ])
            });
        let ports = MockPorts {
            accounts_query: signed_in(),
            predictions,
            ..MockPorts::default()
        };
        let id = MoleculeId::random();
        let (status, body) = send(
            ports,
            test::TestRequest::post()
                .uri(&format!("/api/v1/molecules/{id}/predictions"))
                .set_json(json!({"predictions": [
                    {"category": "toxicity", "payload": {"herg": 0.2}, "confidence": 0.9},
                    {"category": "solubility", "payload": {"logS": -2.1}}
                ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body[0]["category"], "toxicity");
        assert_eq!(body[0]["modelVersion"], "v1");
    }

    #[rstest]
    #[case(json!({"category": "astrology", "payload": {}}), "category")]
    #[case(json!({"category": "toxicity", "payload": [1, 2]}), "payload")]
    #[case(json!({"category": "toxicity", "payload": {}, "confidence": 1.5}), "confidence")]
    #[actix_web::test]
    async fn invalid_entries_are_rejected_with_their_index(
        #[case] entry: Value,
        #[case] field: &str,
    ) {
        let mut predictions = MockPredictionCommand::new();
        predictions.expect_record().never();
        let ports = MockPorts {
            accounts_query: signed_in(),
            predictions,
            ..MockPorts::default()
        };
        let id = MoleculeId::random();
        let (status, body) = send(
            ports,
            test::TestRequest::post()
                .uri(&format!("/api/v1/molecules/{id}/predictions"))
                .set_json(json!({"predictions": [
                    {"category": "admet", "payload": {}},
                    entry
                ]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["index"], 1);
    }

    #[actix_web::test]
    async fn list_filters_by_category() {
        let mut predictions_query = MockPredictionQuery::new();
        predictions_query
            .expect_list()
            .withf(|_, _, category| *category == Some(PredictionCategory::BindingAffinity))
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));
        let ports = MockPorts {
            accounts_query: signed_in(),
            predictions_query,
            ..MockPorts::default()
        };
        let id = MoleculeId::random();
        let (status, _) = send(
            ports,
            test::TestRequest::get().uri(&format!(
                "/api/v1/molecules/{id}/predictions?category=binding_affinity"
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn latest_requires_a_category() {
        let mut predictions_query = MockPredictionQuery::new();
        predictions_query.expect_latest().never();
        let ports = MockPorts {
            accounts_query: signed_in(),
            predictions_query,
            ..MockPorts::default()
        };
        let id = MoleculeId::random();
        let (status, body) = send(
            ports,
            test::TestRequest::get().uri(&format!("/api/v1/molecules/{id}/predictions/latest")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "category");
    }

    #[actix_web::test]
    async fn latest_returns_the_newest_prediction() {
        let mut predictions_query = MockPredictionQuery::new();
        predictions_query
            .expect_latest()
            .withf(|_, _, category| *category == PredictionCategory::Toxicity)
            .returning(|_, _, category| Ok(prediction(category)));
        let ports = MockPorts {
            accounts_query: signed_in(),
            predictions_query,
            ..MockPorts::default()
        };
        let id = MoleculeId::random();
        let (status, body) = send(
            ports,
            test::TestRequest::get().uri(&format!(
                "/api/v1/molecules/{id}/predictions/latest?category=toxicity"
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "toxicity");
    }

    #[actix_web::test]
    async fn summary_is_keyed_by_category() {
        let mut predictions_query = MockPredictionQuery::new();
        predictions_query
            .expect_summary()
            .times(1)
            .returning(|_, molecule| {
                Ok(PredictionSummary::from_newest_first(
                    *molecule,
                    [prediction(PredictionCategory::Toxicity)],
                ))
            });
        let ports = MockPorts {
            accounts_query: signed_in(),
            predictions_query,
            ..MockPorts::default()
        };
        let id = MoleculeId::random();
        let (status, body) = send(
            ports,
            test::TestRequest::get().uri(&format!("/api/v1/molecules/{id}/predictions/summary")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["moleculeId"], json!(id));
        assert_eq!(body["latest"]["toxicity"]["modelVersion"], "v1");
    }
}
