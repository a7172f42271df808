//! Translation of domain errors into JSON responses.
//!
//! The domain [`Error`] stays transport-agnostic; this module owns the
//! status mapping and the response headers that accompany each code.
//! Internal failures are logged here with full detail and reach the client
//! only as a generic message.

use actix_web::http::header::{RETRY_AFTER, WWW_AUTHENTICATE};
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result type returned by every handler.
pub type ApiResult<T> = Result<T, Error>;

/// Message substituted for every `internal_error` payload.
pub const REDACTED_MESSAGE: &str = "Internal server error";

const BEARER_CHALLENGE: &str = "Bearer";

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing copy of `error`. Only the trace id survives redaction.
fn client_payload(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    let redacted = Error::internal(REDACTED_MESSAGE);
    match error.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    }
}

fn insert_code_headers(builder: &mut HttpResponseBuilder, error: &Error) {
    match error.code() {
        ErrorCode::Unauthorized => {
            builder.insert_header((WWW_AUTHENTICATE, BEARER_CHALLENGE));
        }
        ErrorCode::RateLimited => {
            if let Some(seconds) = error.retry_after() {
                builder.insert_header((RETRY_AFTER, seconds.to_string()));
            }
        }
        _ => {}
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if self.code() == ErrorCode::InternalError {
            error!(
                message = self.message(),
                trace_id = self.trace_id().unwrap_or_default(),
                "request failed with internal error"
            );
        }
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        insert_code_headers(&mut builder, self);
        builder.json(client_payload(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced in a handler");
        Self::internal(REDACTED_MESSAGE)
    }
}

#[cfg(test)]
mod tests;
