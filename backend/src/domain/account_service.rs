//! Account domain service: registration, login, identity resolution, and
//! whitelisted account edits.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, Value, json};
use tracing::{debug, error, info};

use crate::domain::authorization::{
    Whitelisted, apply_whitelisted_update, check_ownership, require_admin,
};
use crate::domain::ports::{
    AccountCommand, AccountQuery, ActivityLog, PasswordHasher, SessionTokens, UserRepository,
};
use crate::domain::service_support::{map_repository_error, record_activity, run_blocking};
use crate::domain::{
    ActivityAction, ActivityTarget, Actor, AdminUserChanges, Email, Error, LoginCredentials,
    LoginSuccess, NewActivity, NewUser, ProfileChanges, Registration, SecureUser, TierChange,
    User, UserChanges, UserId, UserUsage,
};

/// Message for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
/// Message for every rejected bearer token.
pub const INVALID_TOKEN: &str = "invalid or expired token";
/// Message for a correct login against a deactivated account.
pub const ACCOUNT_DEACTIVATED: &str = "account is deactivated";

/// Account service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountService<U, H, T, A> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    activity: Arc<A>,
    clock: Arc<dyn Clock>,
}

impl<U, H, T, A> AccountService<U, H, T, A> {
    /// Create a new service over the given adapters.
    pub fn new(
        users: Arc<U>,
        hasher: Arc<H>,
        tokens: Arc<T>,
        activity: Arc<A>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            activity,
            clock,
        }
    }
}

impl<U, H, T, A> AccountService<U, H, T, A>
where
    U: UserRepository,
    H: PasswordHasher + 'static,
    T: SessionTokens,
    A: ActivityLog,
{
    async fn load_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .get_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn persist_user_changes(
        &self,
        actor: &Actor,
        target: &User,
        changes: UserChanges,
        action: ActivityAction,
    ) -> Result<SecureUser, Error> {
        if changes.is_empty() {
            return Ok(SecureUser::from(target));
        }
        let updated = self
            .users
            .update(&target.id(), &changes)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;

        let mut details = Map::new();
        if let Some(tier) = changes.tier {
            details.insert("tier".to_owned(), json!(tier));
        }
        if let Some(is_active) = changes.is_active {
            details.insert("isActive".to_owned(), json!(is_active));
        }
        let mut entry = NewActivity::new(
            actor.user_id,
            action,
            Some(ActivityTarget::User(updated.id())),
        );
        if !details.is_empty() {
            entry = entry.with_details(Value::Object(details));
        }
        record_activity(self.activity.as_ref(), entry).await;
        Ok(SecureUser::from(&updated))
    }
}

#[async_trait]
impl<U, H, T, A> AccountCommand for AccountService<U, H, T, A>
where
    U: UserRepository,
    H: PasswordHasher + 'static,
    T: SessionTokens,
    A: ActivityLog,
{
    async fn register(&self, registration: Registration) -> Result<SecureUser, Error> {
        let Registration {
            email,
            username,
            password,
            full_name,
            institution,
        } = registration;

        let hasher = Arc::clone(&self.hasher);
        let password_hash = run_blocking(move || hasher.hash_password(&password))
            .await?
            .map_err(|err| {
                error!(error = %err, "password hashing failed");
                Error::internal("internal error")
            })?;

        let user = self
            .users
            .create(&NewUser {
                email,
                username,
                password_hash,
                full_name,
                institution,
            })
            .await
            .map_err(map_repository_error)?;

        info!(user = %user.id(), "account registered");
        record_activity(
            self.activity.as_ref(),
            NewActivity::new(
                user.id(),
                ActivityAction::Registered,
                Some(ActivityTarget::User(user.id())),
            ),
        )
        .await;
        Ok(SecureUser::from(&user))
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<LoginSuccess, Error> {
        let user = match Email::parse(credentials.email()) {
            Ok(email) => self
                .users
                .get_by_natural_key(&email)
                .await
                .map_err(map_repository_error)?,
            Err(_) => None,
        };
        // Unknown accounts verify against the decoy so both outcomes cost
        // one full hash computation.
        let stored = user
            .as_ref()
            .map_or_else(|| self.hasher.decoy_hash(), |found| found.password_hash().clone());
        let hasher = Arc::clone(&self.hasher);
        let verified =
            run_blocking(move || hasher.verify_password(credentials.password(), &stored)).await?;
        let Some(user) = user else {
            debug!("login rejected: unknown account");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !verified {
            debug!(user = %user.id(), "login rejected: password mismatch");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        if !user.is_active() {
            return Err(Error::forbidden(ACCOUNT_DEACTIVATED));
        }

        let issued = self
            .tokens
            .create_access_token(&user.id(), self.clock.utc())
            .map_err(|err| {
                error!(error = %err, "failed to issue access token");
                Error::internal("internal error")
            })?;

        record_activity(
            self.activity.as_ref(),
            NewActivity::new(user.id(), ActivityAction::LoggedIn, None),
        )
        .await;
        Ok(LoginSuccess {
            access_token: issued.token,
            token_type: "bearer",
            expires_in: issued.expires_in,
            user: SecureUser::from(&user),
        })
    }

    async fn update_profile(
        &self,
        actor: &Actor,
        fields: Map<String, Value>,
    ) -> Result<SecureUser, Error> {
        let user = self.load_user(&actor.user_id).await?;
        check_ownership(&user, actor)?;
        let Whitelisted { changes, .. } =
            apply_whitelisted_update::<ProfileChanges>(actor.role, &fields, &user)?;
        self.persist_user_changes(actor, &user, changes.into(), ActivityAction::ProfileUpdated)
            .await
    }

    async fn update_user(
        &self,
        actor: &Actor,
        user_id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<SecureUser, Error> {
        require_admin(actor)?;
        let user = self.load_user(user_id).await?;
        let Whitelisted { changes, .. } =
            apply_whitelisted_update::<AdminUserChanges>(actor.role, &fields, &user)?;
        self.persist_user_changes(actor, &user, changes.into(), ActivityAction::UserUpdated)
            .await
    }

    async fn change_tier(
        &self,
        actor: &Actor,
        user_id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<SecureUser, Error> {
        require_admin(actor)?;
        let user = self.load_user(user_id).await?;
        let Whitelisted { changes, .. } =
            apply_whitelisted_update::<TierChange>(actor.role, &fields, &user)?;
        self.persist_user_changes(actor, &user, changes.into(), ActivityAction::TierChanged)
            .await
    }
}

#[async_trait]
impl<U, H, T, A> AccountQuery for AccountService<U, H, T, A>
where
    U: UserRepository,
    H: PasswordHasher + 'static,
    T: SessionTokens,
    A: ActivityLog,
{
    async fn resolve_actor(&self, token: &str) -> Result<Actor, Error> {
        let user_id = self
            .tokens
            .verify_token(token, self.clock.utc())
            .map_err(|err| {
                debug!(error = %err, "bearer token rejected");
                Error::unauthorized(INVALID_TOKEN)
            })?;
        let user = self
            .users
            .get_by_id(&user_id)
            .await
            .map_err(map_repository_error)?
            .filter(User::is_active)
            .ok_or_else(|| Error::unauthorized(INVALID_TOKEN))?;
        Ok(Actor {
            user_id: user.id(),
            role: user.role(),
            tier: user.tier(),
        })
    }

    fn token_subject(&self, token: &str) -> Option<UserId> {
        self.tokens.verify_token(token, self.clock.utc()).ok()
    }

    async fn current_user(&self, actor: &Actor) -> Result<SecureUser, Error> {
        let user = self.load_user(&actor.user_id).await?;
        check_ownership(&user, actor)?;
        Ok(SecureUser::from(&user))
    }

    async fn usage(&self, actor: &Actor) -> Result<UserUsage, Error> {
        let user = self.load_user(&actor.user_id).await?;
        check_ownership(&user, actor)?;
        let counts = self
            .users
            .usage_counts(&user.id())
            .await
            .map_err(map_repository_error)?;
        Ok(UserUsage::new(&user, counts))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
