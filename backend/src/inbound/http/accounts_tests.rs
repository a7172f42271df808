//! Tests for the account handlers.

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test;
use chrono::Utc;
use rstest::rstest;
use serde_json::{Value, json};

use crate::domain::ports::{MockAccountCommand, MockAccountQuery};
use crate::domain::{
    ACCOUNT_DEACTIVATED, AccessToken, Actor, Email, INVALID_CREDENTIALS, Role, SecureUser, Tier,
    UserId, UserUsage, Username,
};
use crate::inbound::http::test_utils::{MockPorts, api_app, permissive_limiter};

use super::*;

fn secure_user(tier: Tier) -> SecureUser {
    SecureUser {
        id: UserId::random(),
        email: Email::parse("a@x.com").expect("valid email"),
        username: Username::parse("alice").expect("valid username"),
        full_name: None,
        institution: None,
        tier,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn member() -> Actor {
    Actor {
        user_id: UserId::random(),
        role: Role::Member,
        tier: Tier::Free,
    }
}

fn authenticated_as(actor: Actor) -> MockAccountQuery {
    let mut query = MockAccountQuery::new();
    query
        .expect_resolve_actor()
        .returning(move |_| Ok(actor));
    query
}

async fn send(ports: MockPorts, req: test::TestRequest) -> (StatusCode, Value) {
    let app = test::init_service(api_app(ports.into_state(permissive_limiter()))).await;
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[actix_web::test]
async fn register_returns_the_secure_projection() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_register()
        .times(1)
        .returning(|_| Ok(secure_user(Tier::Free)));
    let ports = MockPorts {
        accounts,
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": "a@x.com",
                "username": "alice",
                "password": "Secret123!",
                "tier": "enterprise",
                "role": "admin"
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tier"], "free");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("hashedPassword").is_none());
}

#[rstest]
#[case(json!({"email": "not-an-email", "username": "alice", "password": "Secret123!"}), "email")]
#[case(json!({"email": "a@x.com", "username": "a", "password": "Secret123!"}), "username")]
#[case(json!({"email": "a@x.com", "username": "alice", "password": "short"}), "password")]
#[actix_web::test]
async fn register_validates_before_calling_the_service(
    #[case] payload: Value,
    #[case] field: &str,
) {
    let mut accounts = MockAccountCommand::new();
    accounts.expect_register().never();
    let ports = MockPorts {
        accounts,
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn login_returns_a_bearer_token() {
    let mut accounts = MockAccountCommand::new();
    accounts.expect_login().times(1).returning(|credentials| {
        assert_eq!(credentials.email(), "a@x.com");
        Ok(LoginSuccess {
            access_token: AccessToken::new("signed.jwt.value"),
            token_type: "bearer",
            expires_in: 1800,
            user: secure_user(Tier::Pro),
        })
    });
    let ports = MockPorts {
        accounts,
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "a@x.com", "password": "Secret123!"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accessToken"], "signed.jwt.value");
    assert_eq!(body["tokenType"], "bearer");
    assert_eq!(body["expiresIn"], 1800);
}

#[rstest]
#[case(Error::unauthorized(INVALID_CREDENTIALS), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden(ACCOUNT_DEACTIVATED), StatusCode::FORBIDDEN)]
#[actix_web::test]
async fn login_failures_keep_the_service_message(
    #[case] failure: Error,
    #[case] expected: StatusCode,
) {
    let message = failure.message().to_owned();
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_login()
        .return_once(move |_| Err(failure));
    let ports = MockPorts {
        accounts,
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "a@x.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, expected);
    assert_eq!(body["message"], message);
}

#[actix_web::test]
async fn login_rejects_blank_fields() {
    let mut accounts = MockAccountCommand::new();
    accounts.expect_login().never();
    let ports = MockPorts {
        accounts,
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "   ", "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "email");
}

#[actix_web::test]
async fn current_user_requires_a_token() {
    let (status, body) = send(
        MockPorts::default(),
        test::TestRequest::get().uri("/api/v1/users/me"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[actix_web::test]
async fn usage_reports_camel_case_totals() {
    let actor = member();
    let mut query = authenticated_as(actor);
    query
        .expect_usage()
        .withf(move |who| who.user_id == actor.user_id)
        .times(1)
        .returning(move |who| {
            Ok(UserUsage {
                user_id: who.user_id,
                tier: Tier::Pro,
                is_active: true,
                project_count: 3,
                molecule_count: 40,
            })
        });
    let ports = MockPorts {
        accounts_query: query,
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::get()
            .uri("/api/v1/users/me/usage")
            .insert_header((AUTHORIZATION, "Bearer token")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "pro");
    assert_eq!(body["projectCount"], 3);
    assert_eq!(body["moleculeCount"], 40);
    assert_eq!(body["isActive"], true);
    assert_eq!(body["userId"], json!(actor.user_id));
}

#[actix_web::test]
async fn profile_updates_forward_the_raw_object() {
    let actor = member();
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_update_profile()
        .withf(move |who, fields| {
            who.user_id == actor.user_id && fields.get("fullName") == Some(&json!("Ada"))
        })
        .times(1)
        .returning(|_, _| Ok(secure_user(Tier::Free)));
    let ports = MockPorts {
        accounts,
        accounts_query: authenticated_as(actor),
        ..MockPorts::default()
    };
    let (status, _) = send(
        ports,
        test::TestRequest::put()
            .uri("/api/v1/users/me")
            .insert_header((AUTHORIZATION, "Bearer token"))
            .set_json(json!({"fullName": "Ada"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn whitelist_rejections_surface_as_bad_requests() {
    let mut accounts = MockAccountCommand::new();
    accounts.expect_update_profile().returning(|_, _| {
        Err(Error::invalid_request("field not allowed: tier")
            .with_details(json!({"field": "tier", "code": "field_not_allowed"})))
    });
    let ports = MockPorts {
        accounts,
        accounts_query: authenticated_as(member()),
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::put()
            .uri("/api/v1/users/me")
            .insert_header((AUTHORIZATION, "Bearer token"))
            .set_json(json!({"tier": "enterprise"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "tier");
}

#[actix_web::test]
async fn non_object_update_bodies_are_rejected() {
    let mut accounts = MockAccountCommand::new();
    accounts.expect_update_profile().never();
    let ports = MockPorts {
        accounts,
        accounts_query: authenticated_as(member()),
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::put()
            .uri("/api/v1/users/me")
            .insert_header((AUTHORIZATION, "Bearer token"))
            .set_json(json!(["tier", "enterprise"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_body");
}

#[actix_web::test]
async fn tier_changes_reject_malformed_ids() {
    let mut accounts = MockAccountCommand::new();
    accounts.expect_change_tier().never();
    let ports = MockPorts {
        accounts,
        accounts_query: authenticated_as(member()),
        ..MockPorts::default()
    };
    let (status, body) = send(
        ports,
        test::TestRequest::put()
            .uri("/api/v1/users/not-a-uuid/tier")
            .insert_header((AUTHORIZATION, "Bearer token"))
            .set_json(json!({"tier": "pro"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[actix_web::test]
async fn members_cannot_change_tiers() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_change_tier()
        .returning(|_, _, _| Err(Error::forbidden("admin role required")));
    let ports = MockPorts {
        accounts,
        accounts_query: authenticated_as(member()),
        ..MockPorts::default()
    };
    let target = UserId::random();
    let (status, body) = send(
        ports,
        test::TestRequest::put()
            .uri(&format!("/api/v1/users/{target}/tier"))
            .insert_header((AUTHORIZATION, "Bearer token"))
            .set_json(json!({"tier": "enterprise"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}
