//! Account API handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"ada@example.com","username":"ada","password":"..."}
//! POST /api/v1/auth/login {"email":"ada@example.com","password":"..."}
//! GET /api/v1/users/me
//! GET /api/v1/users/me/usage
//! PUT /api/v1/users/me {"fullName":"Ada Lovelace"}
//! PUT /api/v1/users/{id} {"isActive":false}
//! PUT /api/v1/users/{id}/tier {"tier":"pro"}
//! ```
//!
//! Update bodies are passed to the account service as raw JSON objects so the
//! service can reject any key outside the caller's whitelist before parsing.

use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{
    Error, LoginCredentials, LoginSuccess, RateClass, Registration, SecureUser, Tier, UserId,
    UserUsage,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, map_login_validation_error, parse_id};
use crate::middleware::RateLimit;

/// Registration body for `POST /api/v1/auth/register`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub institution: Option<String>,
}

/// Login body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Keys accepted by `PUT /api/v1/users/me`. Any other key is rejected.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    pub institution: Option<String>,
}

/// Keys accepted by `PUT /api/v1/users/{id}`. Any other key is rejected.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdateRequest {
    pub full_name: Option<String>,
    pub institution: Option<String>,
    pub tier: Option<Tier>,
    pub is_active: Option<bool>,
}

/// Body of `PUT /api/v1/users/{id}/tier`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TierChangeRequest {
    pub tier: Tier,
}

/// Create a `free`, `member` account.
///
/// Role, tier, and activation flags are not part of the body; anything the
/// caller sends under those names is ignored and the account starts
/// unprivileged.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SecureUser),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email or username already taken", body = Error),
        (status = 429, description = "Too many registrations", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register", wrap = "RateLimit::new(RateClass::Register)")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let registration = Registration::try_new(
        &body.email,
        &body.username,
        &body.password,
        body.full_name.as_deref(),
        body.institution.as_deref(),
    )?;
    let user = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Verify credentials and issue a bearer token.
///
/// Unknown emails and wrong passwords produce the same response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginSuccess),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 403, description = "Account deactivated", body = Error),
        (status = 429, description = "Too many login attempts", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login", wrap = "RateLimit::new(RateClass::Login)")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginSuccess>> {
    let body = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&body.email, &body.password)
        .map_err(map_login_validation_error)?;
    let success = state.accounts.login(credentials).await?;
    Ok(web::Json(success))
}

/// Return the authenticated user's own account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = SecureUser),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limited", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/users/me", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<SecureUser>> {
    let user = state.accounts_query.current_user(auth.actor()).await?;
    Ok(web::Json(user))
}

/// Report the caller's tier, activity status, and owned-resource totals.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/usage",
    responses(
        (status = 200, description = "Usage totals", body = UserUsage),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limited", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentUserUsage"
)]
#[get("/users/me/usage", wrap = "RateLimit::new(RateClass::Read)")]
pub async fn current_user_usage(
    state: web::Data<HttpState>,
    auth: Authenticated,
) -> ApiResult<web::Json<UserUsage>> {
    let usage = state.accounts_query.usage(auth.actor()).await?;
    Ok(web::Json(usage))
}

/// Edit the caller's own display fields (`fullName`, `institution`).
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = SecureUser),
        (status = 400, description = "Field not allowed or invalid", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limited", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateCurrentUser"
)]
#[put("/users/me", wrap = "RateLimit::new(RateClass::Update)")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<web::Json<SecureUser>> {
    let user = state
        .accounts
        .update_profile(auth.actor(), payload.into_inner())
        .await?;
    Ok(web::Json(user))
}

/// Assign a tier to any account. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/tier",
    params(("id" = String, Path, description = "User identifier")),
    request_body = TierChangeRequest,
    responses(
        (status = 200, description = "Updated user", body = SecureUser),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "changeTier"
)]
#[put("/users/{id}/tier", wrap = "RateLimit::new(RateClass::Update)")]
pub async fn change_tier(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<web::Json<SecureUser>> {
    let user_id: UserId = parse_id(&path, FieldName::new("id"))?;
    let user = state
        .accounts
        .change_tier(auth.actor(), &user_id, payload.into_inner())
        .await?;
    Ok(web::Json(user))
}

/// Administrative edit of any account, limited to the admin whitelist.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    request_body = AdminUserUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = SecureUser),
        (status = 400, description = "Field not allowed or invalid", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateUser"
)]
#[put("/users/{id}", wrap = "RateLimit::new(RateClass::Update)")]
pub async fn update_user(
    state: web::Data<HttpState>,
    auth: Authenticated,
    path: web::Path<String>,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<web::Json<SecureUser>> {
    let user_id: UserId = parse_id(&path, FieldName::new("id"))?;
    let user = state
        .accounts
        .update_user(auth.actor(), &user_id, payload.into_inner())
        .await?;
    Ok(web::Json(user))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
