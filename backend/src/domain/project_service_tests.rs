//! Tests for the project service.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ports::{MockActivityLog, MockProjectRepository, RepositoryError};
use crate::domain::{ActivityId, ActivityLogEntry, ErrorCode, Role, Tier, UserId};

fn project_owned_by(owner: UserId) -> Project {
    let at = Utc
        .with_ymd_and_hms(2026, 2, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    Project {
        id: ProjectId::random(),
        user_id: owner,
        name: "Kinase panel".into(),
        description: None,
        disease_target: Some("EGFR".into()),
        created_at: at,
        updated_at: at,
    }
}

fn actor(role: Role) -> Actor {
    Actor {
        user_id: UserId::random(),
        role,
        tier: Tier::Free,
    }
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
    projects: MockProjectRepository,
    activity: MockActivityLog,
) -> ProjectService<MockProjectRepository, MockActivityLog> {
    ProjectService::new(Arc::new(projects), Arc::new(activity))
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("json object")
}

#[rstest]
#[tokio::test]
async fn create_binds_the_project_to_the_actor(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let owner = caller.user_id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_create()
        .withf(move |new| new.user_id == owner && new.name == "Kinase panel")
        .times(1)
        .returning(move |new| Ok(project_owned_by(new.user_id)));

    let service = make_service(projects, activity);
    let draft = ProjectDraft::try_new("Kinase panel", None, None).expect("valid draft");
    let created = service.create(&caller, draft).await.expect("created");
    assert_eq!(created.user_id, owner);
}

#[rstest]
#[case(Role::Member, Err(ErrorCode::Forbidden))]
#[case(Role::Admin, Ok(()))]
#[tokio::test]
async fn reading_another_users_project(
    activity: MockActivityLog,
    #[case] role: Role,
    #[case] expected: Result<(), ErrorCode>,
) {
    let project = project_owned_by(UserId::random());
    let id = project.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_get_by_id()
        .return_once(move |_| Ok(Some(project)));

    let service = make_service(projects, activity);
    let outcome = service.get(&actor(role), &id).await;
    assert_eq!(outcome.map(|_| ()).map_err(|err| err.code()), expected);
}

#[rstest]
#[tokio::test]
async fn missing_projects_are_not_found(activity: MockActivityLog) {
    let mut projects = MockProjectRepository::new();
    projects.expect_get_by_id().returning(|_| Ok(None));

    let service = make_service(projects, activity);
    let err = service
        .get(&actor(Role::Member), &ProjectId::random())
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn foreign_update_never_reaches_storage(activity: MockActivityLog) {
    let project = project_owned_by(UserId::random());
    let id = project.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_get_by_id()
        .return_once(move |_| Ok(Some(project)));
    projects.expect_update().never();

    let service = make_service(projects, activity);
    let err = service
        .update(&actor(Role::Member), &id, object(json!({ "name": "Stolen" })))
        .await
        .expect_err("foreign project");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(json!({ "userId": "00000000-0000-0000-0000-000000000000" }))]
#[case(json!({ "name": "Renamed", "createdAt": "2020-01-01T00:00:00Z" }))]
#[tokio::test]
async fn protected_fields_reject_the_whole_update(
    activity: MockActivityLog,
    #[case] body: Value,
) {
    let caller = actor(Role::Member);
    let project = project_owned_by(caller.user_id);
    let id = project.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_get_by_id()
        .return_once(move |_| Ok(Some(project)));
    projects.expect_update().never();

    let service = make_service(projects, activity);
    let err = service
        .update(&caller, &id, object(body))
        .await
        .expect_err("protected field");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn owners_update_whitelisted_fields(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let project = project_owned_by(caller.user_id);
    let id = project.id;
    let renamed = project.with_changes(&ProjectChanges {
        name: Some("Renamed".into()),
        ..ProjectChanges::default()
    });
    let mut projects = MockProjectRepository::new();
    projects
        .expect_get_by_id()
        .return_once(move |_| Ok(Some(project)));
    projects
        .expect_update()
        .withf(|_, changes| changes.name.as_deref() == Some("Renamed"))
        .times(1)
        .return_once(move |_, _| Ok(Some(renamed)));

    let service = make_service(projects, activity);
    let updated = service
        .update(&caller, &id, object(json!({ "name": "Renamed" })))
        .await
        .expect("updated");
    assert_eq!(updated.name, "Renamed");
}

#[rstest]
#[tokio::test]
async fn empty_update_returns_the_stored_project(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let project = project_owned_by(caller.user_id);
    let id = project.id;
    let mut projects = MockProjectRepository::new();
    let stored = project.clone();
    projects
        .expect_get_by_id()
        .return_once(move |_| Ok(Some(stored)));
    projects.expect_update().never();

    let service = make_service(projects, activity);
    let unchanged = service
        .update(&caller, &id, Map::new())
        .await
        .expect("no-op");
    assert_eq!(unchanged, project);
}

#[rstest]
#[tokio::test]
async fn delete_checks_ownership_first(activity: MockActivityLog) {
    let project = project_owned_by(UserId::random());
    let id = project.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_get_by_id()
        .return_once(move |_| Ok(Some(project)));
    projects.expect_delete().never();

    let service = make_service(projects, activity);
    let err = service
        .delete(&actor(Role::Member), &id)
        .await
        .expect_err("foreign project");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn list_is_scoped_to_the_actor(activity: MockActivityLog) {
    let caller = actor(Role::Member);
    let owner = caller.user_id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_search()
        .withf(move |user, filter| *user == owner && filter.limit == 10)
        .returning(move |user, _| Ok(vec![project_owned_by(*user)]));

    let service = make_service(projects, activity);
    let filter = ProjectFilter::try_new(None, Some(10)).expect("valid filter");
    let listed = service.list(&caller, filter).await.expect("listed");
    assert!(listed.iter().all(|project| project.user_id == owner));
}

#[rstest]
#[tokio::test]
async fn storage_outages_surface_as_unavailable(activity: MockActivityLog) {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_search()
        .returning(|_, _| Err(RepositoryError::connection("pool timed out")));

    let service = make_service(projects, activity);
    let err = service
        .list(&actor(Role::Member), ProjectFilter::default())
        .await
        .expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(!err.message().contains("pool"));
}
