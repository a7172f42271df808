//! Activity feed handler.
//!
//! ```text
//! GET /api/v1/activity?limit=50
//! ```

use actix_web::{get, web};
use serde::Deserialize;

use crate::domain::{ActivityLogEntry, DEFAULT_ACTIVITY_LIMIT, Error, RateClass};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::middleware::RateLimit;

/// Query parameters for `GET /api/v1/activity`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityParams {
    /// Between 1 and 200; defaults to 50.
    pub limit: Option<u32>,
}

/// The caller's own audit trail, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/activity",
    params(ActivityParams),
    responses(
        (status = 200, description = "Recent activity", body = [ActivityLogEntry]),
        (status = 400, description = "Limit out of range", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["activity"],
    operation_id = "recentActivity"
)]
#[get("/activity", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn recent_activity(
    state: web::Data<HttpState>,
    auth: Authenticated,
    params: web::Query<ActivityParams>,
) -> ApiResult<web::Json<Vec<ActivityLogEntry>>> {
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    let entries = state.activity.recent(auth.actor(), limit).await?;
    Ok(web::Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockAccountQuery, MockActivityQuery};
    use crate::domain::validation::{ValidationCode, ValidationError};
    use crate::domain::{
        ActivityAction, ActivityId, ActivityTarget, Actor, ProjectId, Role, Tier, UserId,
    };
    use crate::inbound::http::test_utils::{MockPorts, api_app, permissive_limiter};
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::Value;

    fn ports_with(caller: Actor, activity: MockActivityQuery) -> MockPorts {
        let mut accounts_query = MockAccountQuery::new();
        accounts_query
            .expect_resolve_actor()
            .returning(move |_| Ok(caller));
        MockPorts {
            accounts_query,
            activity,
            ..MockPorts::default()
        }
    }

    fn caller() -> Actor {
        Actor {
            user_id: UserId::random(),
            role: Role::Member,
            tier: Tier::Free,
        }
    }

    async fn get(ports: MockPorts, uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(api_app(ports.into_state(permissive_limiter()))).await;
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header((AUTHORIZATION, "Bearer token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        let status = res.status();
        let body = test::read_body(res).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[rstest]
    #[case("/api/v1/activity", DEFAULT_ACTIVITY_LIMIT)]
    #[case("/api/v1/activity?limit=5", 5)]
    #[actix_web::test]
    async fn forwards_the_limit(#[case] uri: &str, #[case] expected: u32) {
        let who = caller();
        let mut activity = MockActivityQuery::new();
        activity
            .expect_recent()
            .withf(move |actor, limit| actor.user_id == who.user_id && *limit == expected)
            .times(1)
            .returning(|actor, _| {
                Ok(vec![ActivityLogEntry {
                    id: ActivityId::random(),
                    user_id: actor.user_id,
                    action: ActivityAction::ProjectCreated,
                    target: Some(ActivityTarget::Project(ProjectId::random())),
                    details: None,
                    created_at: Utc::now(),
                }])
            });
        let (status, body) = get(ports_with(who, activity), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["action"], "project_created");
        assert_eq!(body[0]["target"]["kind"], "project");
    }

    #[actix_web::test]
    async fn out_of_range_limit_is_a_bad_request() {
        let mut activity = MockActivityQuery::new();
        activity
            .expect_recent()
            .returning(|_, _| Err(ValidationError::new("limit", ValidationCode::OutOfRange).into()));
        let (status, body) = get(ports_with(caller(), activity), "/api/v1/activity?limit=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "limit");
    }

    #[actix_web::test]
    async fn requires_a_bearer_token() {
        let app = test::init_service(api_app(
            MockPorts::default().into_state(permissive_limiter()),
        ))
        .await;
        let req = test::TestRequest::get().uri("/api/v1/activity").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
