//! Tests for the prediction service.

use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::{
    MockActivityLog, MockMoleculeRepository, MockPredictionRepository, RepositoryError,
};
use crate::domain::{
    ActivityId, ActivityLogEntry, ErrorCode, MolecularProperties, MoleculeDraft, PredictionId,
    ProjectId, Role, Tier, UserId,
};

type Service =
    PredictionService<MockMoleculeRepository, MockPredictionRepository, MockActivityLog>;

fn actor(role: Role) -> Actor {
    Actor {
        user_id: UserId::random(),
        role,
        tier: Tier::Enterprise,
    }
}

fn molecule_owned_by(owner: UserId) -> Molecule {
    let new = MoleculeDraft::try_new("CCO", None, None, MolecularProperties::default())
        .expect("valid draft")
        .into_new(ProjectId::random(), owner);
    Molecule {
        id: MoleculeId::random(),
        project_id: new.project_id,
        user_id: new.user_id,
        smiles: new.smiles,
        name: new.name,
        generation_method: new.generation_method,
        properties: new.properties,
        created_at: Utc::now(),
    }
}

fn stored(new: &NewPrediction) -> Prediction {
    Prediction {
        id: PredictionId::random(),
        molecule_id: new.molecule_id,
        category: new.category,
        payload: new.payload.clone(),
        confidence: new.confidence,
        model_version: new.model_version.clone(),
        created_at: Utc::now(),
    }
}

fn draft(category: PredictionCategory) -> PredictionDraft {
    PredictionDraft::try_new(category, json!({ "score": 0.4 }), Some(0.9), Some("v2"))
        .expect("valid draft")
}

fn molecules_returning(molecule: Molecule) -> MockMoleculeRepository {
    let mut molecules = MockMoleculeRepository::new();
    molecules
        .expect_get_by_id()
        .return_once(move |_| Ok(Some(molecule)));
    molecules
}

#[fixture]
fn activity() -> MockActivityLog {
    let mut activity = MockActivityLog::new();
    activity.expect_append().returning(|entry| {
        Ok(ActivityLogEntry {
            id: ActivityId::random(),
            user_id: entry.user_id,
            action: entry.action,
            target: entry.target,
            details: entry.details.clone(),
            created_at: Utc::now(),
        })
    });
    activity
}

fn make_service(
    molecules: MockMoleculeRepository,
    predictions: MockPredictionRepository,
    activity: MockActivityLog,
) -> Service {
    PredictionService::new(Arc::new(molecules), Arc::new(predictions), Arc::new(activity))
}

#[rstest]
#[tokio::test]
async fn owners_record_predictions(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let molecule = molecule_owned_by(caller.user_id);
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions
        .expect_bulk_create()
        .withf(move |batch| batch.len() == 2 && batch.iter().all(|p| p.molecule_id == id))
        .times(1)
        .returning(|batch| Ok(batch.iter().map(stored).collect()));

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let recorded = service
        .record(
            &caller,
            &id,
            vec![
                draft(PredictionCategory::Admet),
                draft(PredictionCategory::Toxicity),
            ],
        )
        .await
        .expect("recorded");
    assert_eq!(recorded.len(), 2);
}

#[rstest]
#[tokio::test]
async fn foreign_molecules_reject_predictions(activity: MockActivityLog) {
    let molecule = molecule_owned_by(UserId::random());
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions.expect_bulk_create().never();

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let err = service
        .record(&actor(Role::Member), &id, vec![draft(PredictionCategory::Admet)])
        .await
        .expect_err("foreign molecule");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn duplicate_model_versions_conflict(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let molecule = molecule_owned_by(caller.user_id);
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions
        .expect_bulk_create()
        .returning(|_| Err(RepositoryError::conflict("modelVersion")));

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let err = service
        .record(&caller, &id, vec![draft(PredictionCategory::Admet)])
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(0)]
#[case(MAX_BULK_PREDICTIONS + 1)]
#[tokio::test]
async fn batch_size_is_bounded(activity: MockActivityLog, #[case] size: usize) {
    let mut molecules = MockMoleculeRepository::new();
    molecules.expect_get_by_id().never();

    let service = make_service(molecules, MockPredictionRepository::new(), activity);
    let err = service
        .record(
            &actor(Role::Member),
            &MoleculeId::random(),
            vec![draft(PredictionCategory::Admet); size],
        )
        .await
        .expect_err("bad batch size");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn list_forwards_the_category_filter(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let molecule = molecule_owned_by(caller.user_id);
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions
        .expect_list_for_molecule()
        .withf(move |target, category| {
            *target == id && *category == Some(PredictionCategory::Toxicity)
        })
        .times(1)
        .returning(|_, _| Ok(Vec::new()));

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let listed = service
        .list(&caller, &id, Some(PredictionCategory::Toxicity))
        .await
        .expect("listed");
    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn latest_without_predictions_is_not_found(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let molecule = molecule_owned_by(caller.user_id);
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions
        .expect_latest_by_category()
        .returning(|_, _| Ok(None));

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let err = service
        .latest(&caller, &id, PredictionCategory::Admet)
        .await
        .expect_err("none recorded");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn foreign_latest_is_denied_before_lookup(activity: MockActivityLog) {
    let molecule = molecule_owned_by(UserId::random());
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions.expect_latest_by_category().never();

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let err = service
        .latest(&actor(Role::Member), &id, PredictionCategory::Admet)
        .await
        .expect_err("foreign molecule");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn summary_groups_the_newest_per_category(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let molecule = molecule_owned_by(caller.user_id);
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions
        .expect_list_for_molecule()
        .withf(move |target, category| *target == id && category.is_none())
        .times(1)
        .returning(move |_, _| {
            let newest = stored(&draft(PredictionCategory::Toxicity).for_molecule(id));
            let older = Prediction {
                model_version: "v1".to_owned(),
                ..stored(&draft(PredictionCategory::Toxicity).for_molecule(id))
            };
            let admet = stored(&draft(PredictionCategory::Admet).for_molecule(id));
            Ok(vec![newest, admet, older])
        });

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let summary = service.summary(&caller, &id).await.expect("summary");

    assert_eq!(summary.molecule_id, id);
    assert_eq!(summary.latest.len(), 2);
    assert_eq!(summary.latest["toxicity"].model_version, "v2");
    assert!(summary.latest.contains_key("admet"));
}

#[rstest]
#[tokio::test]
async fn foreign_summary_is_denied_before_lookup(activity: MockActivityLog) {
    let molecule = molecule_owned_by(UserId::random());
    let id = molecule.id;
    let mut predictions = MockPredictionRepository::new();
    predictions.expect_list_for_molecule().never();

    let service = make_service(molecules_returning(molecule), predictions, activity);
    let err = service
        .summary(&actor(Role::Member), &id)
        .await
        .expect_err("foreign molecule");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
