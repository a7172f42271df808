//! Shared validation helpers for inbound HTTP adapters.
//!
//! Extractor failures (malformed JSON, bad query strings, unparsable path
//! segments) are folded into the same `invalid_request` envelope that domain
//! validation produces, so clients see one error shape for every 400.

use std::str::FromStr;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, web};
use serde_json::json;
use tracing::debug;

use crate::domain::validation::ValidationError;
use crate::domain::{Error, LoginValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidBody,
    InvalidQuery,
    InvalidPath,
    Required,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidBody => "invalid_body",
            ErrorCode::InvalidQuery => "invalid_query",
            ErrorCode::InvalidPath => "invalid_path",
            ErrorCode::Required => "required",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) fn invalid_uuid_error(field: FieldName) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Parse an identifier from a path segment.
///
/// The raw value is deliberately left out of the error details.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: FieldName) -> Result<T, Error> {
    raw.parse().map_err(|_| invalid_uuid_error(field))
}

/// Map login shape errors to `400 invalid_request`.
pub(crate) fn map_login_validation_error(err: LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::EmptyEmail => "email",
        LoginValidationError::EmptyPassword => "password",
    };
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": field,
        "code": ErrorCode::Required.as_str(),
    }))
}

/// Attach the position of the offending element to a batch validation error.
pub(crate) fn indexed(index: usize, err: ValidationError) -> Error {
    let base = Error::from(err);
    let mut details = base.details().cloned().unwrap_or_else(|| json!({}));
    if let Some(map) = details.as_object_mut() {
        map.insert("index".to_owned(), json!(index));
    }
    base.with_details(details)
}

fn extractor_error(message: &str, code: ErrorCode) -> actix_web::Error {
    Error::invalid_request(message)
        .with_details(json!({ "code": code.as_str() }))
        .into()
}

/// JSON body extractor failures become `400 invalid_request`.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, path = %req.path(), "rejected JSON body");
    let message = match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "request body is too large"
        }
        JsonPayloadError::ContentType => "content type must be application/json",
        _ => "request body is not valid JSON for this endpoint",
    };
    extractor_error(message, ErrorCode::InvalidBody)
}

/// Query string extractor failures become `400 invalid_request`.
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, path = %req.path(), "rejected query string");
    extractor_error("query parameters are invalid", ErrorCode::InvalidQuery)
}

/// Path extractor failures become `400 invalid_request`.
pub fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, path = %req.path(), "rejected path parameters");
    extractor_error("path parameters are invalid", ErrorCode::InvalidPath)
}

/// Largest JSON body accepted; sized for a full bulk molecule batch.
pub const JSON_BODY_LIMIT: usize = 1 << 20;

/// Extractor configuration registered once on the application.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(json_error_handler)
}

/// Query extractor configuration registered once on the application.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}

/// Path extractor configuration registered once on the application.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(path_error_handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode as DomainCode, ProjectId};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, HttpResponse};
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::Value;

    #[rstest]
    fn parses_well_formed_ids() {
        let id: ProjectId =
            parse_id("3fa85f64-5717-4562-b3fc-2c963f66afa6", FieldName::new("projectId"))
                .expect("valid id");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    fn malformed_ids_do_not_echo_input() {
        let err = parse_id::<ProjectId>("<script>", FieldName::new("projectId"))
            .expect_err("invalid id");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "projectId");
        assert!(!details.to_string().contains("<script>"));
    }

    #[rstest]
    #[case(LoginValidationError::EmptyEmail, "email")]
    #[case(LoginValidationError::EmptyPassword, "password")]
    fn login_errors_name_the_field(#[case] err: LoginValidationError, #[case] field: &str) {
        let mapped = map_login_validation_error(err);
        assert_eq!(mapped.code(), DomainCode::InvalidRequest);
        assert_eq!(mapped.details().expect("details")["field"], field);
    }

    #[derive(Deserialize)]
    struct Body {
        #[expect(dead_code, reason = "shape only")]
        name: String,
    }

    #[derive(Deserialize)]
    struct Params {
        #[expect(dead_code, reason = "shape only")]
        limit: u32,
    }

    #[actix_web::test]
    async fn extractor_failures_share_the_error_envelope() {
        let app = actix_test::init_service(
            App::new()
                .app_data(json_config())
                .app_data(query_config())
                .route(
                    "/body",
                    web::post().to(|_: web::Json<Body>| async { HttpResponse::Ok() }),
                )
                .route(
                    "/query",
                    web::get().to(|_: web::Query<Params>| async { HttpResponse::Ok() }),
                ),
        )
        .await;

        let bad_body = actix_test::TestRequest::post()
            .uri("/body")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let res = actix_test::call_service(&app, bad_body).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(value["code"], "invalid_request");
        assert_eq!(value["details"]["code"], "invalid_body");

        let bad_query = actix_test::TestRequest::get().uri("/query?limit=many").to_request();
        let res = actix_test::call_service(&app, bad_query).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(value["details"]["code"], "invalid_query");
    }
}
