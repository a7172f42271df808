//! Bearer authentication for HTTP handlers.
//!
//! Handlers that need a caller take an [`Authenticated`] argument. Extraction
//! reads the `Authorization: Bearer <token>` header, resolves the actor from
//! storage through [`AccountQuery`](crate::domain::ports::AccountQuery), and
//! charges the request to the actor's tier quota. Role and tier are never
//! read from the token itself.
//!
//! The tier quota is therefore charged after the actor lookup: the quota
//! size depends on the stored tier. Floods with valid tokens are bounded
//! before any storage read by the per-user class window that
//! [`RateLimit`](crate::middleware::RateLimit) applies ahead of extraction.
//! Tokens that fail to resolve never touch the tier counter.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::error;

use crate::domain::{Actor, Error, INVALID_TOKEN};

use super::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// Message returned when no bearer credential accompanies the request.
pub const AUTHENTICATION_REQUIRED: &str = "authentication required";

/// Extract the raw bearer token from the `Authorization` header.
///
/// The scheme is matched case-insensitively. A missing header, another
/// scheme, or an empty token are all rejected with `401 Unauthorized`.
///
/// # Examples
/// ```
/// use actix_web::test::TestRequest;
/// use discovery_backend::inbound::http::auth::bearer_token;
///
/// let req = TestRequest::default()
///     .insert_header(("Authorization", "Bearer abc.def.ghi"))
///     .to_http_request();
/// assert_eq!(bearer_token(&req).expect("token"), "abc.def.ghi");
/// ```
pub fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Err(Error::unauthorized(AUTHENTICATION_REQUIRED));
    };
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized(INVALID_TOKEN))?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| Error::unauthorized(INVALID_TOKEN))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) || token.is_empty() {
        return Err(Error::unauthorized(INVALID_TOKEN));
    }
    Ok(token)
}

/// Authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Actor);

impl Authenticated {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req).map(str::to_owned);
        Box::pin(async move {
            let Some(state) = state else {
                error!("HTTP state missing from application data");
                return Err(Error::internal("HTTP state not configured").into());
            };
            let token = token?;
            // Tier comes from storage, so the quota can only be charged once
            // the actor is resolved.
            let actor = state.accounts_query.resolve_actor(&token).await?;
            state.rate_limiter.admit_tier(&actor).await?;
            Ok(Self(actor))
        })
    }
}
