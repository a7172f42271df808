//! Status, header, and redaction behaviour of error responses.

use super::*;
use actix_web::body::to_bytes;
use actix_web::http::header::HeaderMap;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn leaky_internal() -> Error {
    Error::internal("connection to db-primary:5432 refused")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"dsn": "postgres://app:hunter2@db"}))
}

async fn render(error: &Error) -> (StatusCode, HeaderMap, Error) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body()).await.expect("body");
    let payload = serde_json::from_slice(&bytes).expect("error json");
    (status, headers, payload)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no token"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("access denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("project not found"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("email already registered"), StatusCode::CONFLICT)]
#[case(Error::rate_limited(5), StatusCode::TOO_MANY_REQUESTS)]
#[case(Error::service_unavailable("service unavailable"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn codes_map_to_statuses(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(leaky_internal: Error) {
    let (status, headers, payload) = render(&leaky_internal).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload.message(), REDACTED_MESSAGE);
    assert!(payload.details().is_none());
    assert_eq!(payload.trace_id(), Some(TRACE_ID));
    assert_eq!(
        headers.get(TRACE_ID_HEADER).and_then(|v| v.to_str().ok()),
        Some(TRACE_ID)
    );
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_their_details() {
    let error = Error::forbidden("access denied")
        .with_details(json!({"rejectedFields": ["ownerId"]}));

    let (_, headers, payload) = render(&error).await;

    assert_eq!(payload, error);
    assert!(headers.get(TRACE_ID_HEADER).is_none());
}

#[rstest]
#[actix_web::test]
async fn rate_limited_responses_carry_retry_after() {
    let (_, headers, payload) = render(&Error::rate_limited(42)).await;

    assert_eq!(
        headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
        Some("42")
    );
    assert_eq!(payload.retry_after(), Some(42));
    assert_eq!(payload.details(), Some(&json!({"retryAfter": 42})));
}

#[rstest]
#[actix_web::test]
async fn unauthorised_responses_challenge_for_a_bearer_token() {
    let (_, headers, _) = render(&Error::unauthorized("authentication required")).await;

    assert_eq!(
        headers.get(WWW_AUTHENTICATE).and_then(|v| v.to_str().ok()),
        Some(BEARER_CHALLENGE)
    );
    assert!(headers.get(RETRY_AFTER).is_none());
}

#[rstest]
#[case(Error::forbidden("access denied"))]
#[case(Error::conflict("username already taken"))]
#[actix_web::test]
async fn other_codes_add_no_extra_headers(#[case] error: Error) {
    let (_, headers, _) = render(&error).await;

    assert!(headers.get(RETRY_AFTER).is_none());
    assert!(headers.get(WWW_AUTHENTICATE).is_none());
}

#[rstest]
fn framework_errors_become_redacted_internal_errors() {
    let err = actix_web::error::ErrorBadGateway("upstream detail");
    let mapped = Error::from(err);
    assert_eq!(mapped.code(), ErrorCode::InternalError);
    assert_eq!(mapped.message(), REDACTED_MESSAGE);
}
