//! Per-endpoint rate limiting middleware.
//!
//! Each route is wrapped with the [`RateClass`] it belongs to. Authenticated
//! classes count against the verified token subject when a valid bearer token
//! is present; login, registration, and anonymous calls count against the
//! socket peer address. Rejections short-circuit with the limiter's error:
//! `429` with `Retry-After`, or `503` when the counter store is unreachable
//! and the limiter fails closed.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::{ClientKey, Error as DomainError, RateClass};
use crate::inbound::http::auth::bearer_token;
use crate::inbound::http::state::HttpState;

const UNKNOWN_PEER: &str = "unknown";

/// Rate-limit middleware for one endpoint class.
///
/// # Examples
/// ```
/// use actix_web::{App, HttpResponse, web};
/// use discovery_backend::domain::RateClass;
/// use discovery_backend::middleware::RateLimit;
///
/// let app = App::new().service(
///     web::resource("/projects")
///         .wrap(RateLimit::new(RateClass::Read))
///         .route(web::get().to(HttpResponse::Ok)),
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    class: RateClass,
}

impl RateLimit {
    pub const fn new(class: RateClass) -> Self {
        Self { class }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            class: self.class,
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    class: RateClass,
}

/// Counter identity for `class`: the verified token subject on authenticated
/// classes, the socket peer otherwise.
///
/// Forwarding headers are not consulted; they are client-controlled.
fn client_key(req: &ServiceRequest, state: &HttpState, class: RateClass) -> ClientKey {
    let subject = class
        .counts_per_subject()
        .then(|| bearer_token(req.request()).ok())
        .flatten()
        .and_then(|token| state.accounts_query.token_subject(token));
    match subject {
        Some(user_id) => ClientKey::for_user(user_id),
        None => {
            let peer = req
                .peer_addr()
                .map_or_else(|| UNKNOWN_PEER.to_owned(), |addr| addr.ip().to_string());
            ClientKey::for_peer(&peer)
        }
    }
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let class = self.class;
        let service = Rc::clone(&self.service);
        let Some(state) = req.app_data::<web::Data<HttpState>>().cloned() else {
            error!(%class, "HTTP state missing; rejecting rate-limited request");
            let err = DomainError::internal("HTTP state not configured");
            return Box::pin(async move { Ok(req.error_response(err).map_into_right_body()) });
        };
        if !state.rate_limiter.policy().enabled {
            return Box::pin(async move {
                service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body)
            });
        }
        let client = client_key(&req, &state, class);
        Box::pin(async move {
            if let Err(err) = state.rate_limiter.admit_class(class, &client).await {
                return Ok(req.error_response(err).map_into_right_body());
            }
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}
