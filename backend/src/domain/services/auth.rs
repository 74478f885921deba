//! Login, signup and principal resolution.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::auth::{
    LoginCredentials, SignupDetails, hash_password, validate_new_password, verify_password,
};
use crate::domain::ports::{UserGroupRepository, UserRepository};
use crate::domain::{Error, Principal, User, UserId};

use super::invalid;

/// Role label given to self-registered accounts.
const DEFAULT_ROLE: &str = "User";

/// Changes a signed-in user may make to their own account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Authenticates users and turns session user ids into principals.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn UserGroupRepository>,
    clock: Arc<dyn Clock>,
    signup_enabled: bool,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn UserGroupRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            groups,
            clock,
            signup_enabled: true,
        }
    }

    /// Enable or disable self-service signup.
    #[must_use]
    pub fn with_signup(mut self, enabled: bool) -> Self {
        self.signup_enabled = enabled;
        self
    }

    /// Check credentials and resolve the caller.
    ///
    /// Unknown emails are reported as `not_found`; wrong passwords and
    /// deleted accounts as `unauthorized`.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Principal, Error> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;
        if user.is_deleted {
            return Err(Error::unauthorized("account is disabled"));
        }
        if !verify_password(credentials.password(), &user.password_hash) {
            return Err(Error::unauthorized("invalid credentials"));
        }
        info!(user_id = %user.id, "login succeeded");
        self.resolve(user).await
    }

    /// Register a new account with the default role and no group.
    pub async fn signup(&self, details: &SignupDetails) -> Result<Principal, Error> {
        if !self.signup_enabled {
            return Err(Error::forbidden("signup is disabled"));
        }
        if self.users.find_by_email(details.email()).await?.is_some() {
            return Err(Error::invalid_request("a user with this email already exists"));
        }
        let password_hash =
            hash_password(details.password()).map_err(|err| Error::internal(err.to_string()))?;
        let now = self.clock.utc();
        let user = User {
            id: UserId::random(),
            name: details.name().to_owned(),
            email: details.email().clone(),
            role: DEFAULT_ROLE.to_owned(),
            group_id: None,
            location_id: None,
            password_hash,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(&user).await?;
        info!(user_id = %user.id, "user signed up");
        self.resolve(user).await
    }

    /// Resolve the principal behind a session. Missing or deleted users are
    /// treated as signed out.
    pub async fn principal(&self, id: &UserId) -> Result<Principal, Error> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .filter(|user| !user.is_deleted)
            .ok_or_else(|| Error::unauthorized("login required"))?;
        self.resolve(user).await
    }

    /// Update the caller's own name or password.
    pub async fn update_profile(
        &self,
        principal: &Principal,
        update: ProfileUpdate,
    ) -> Result<Principal, Error> {
        let mut user = principal.user.clone();
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::invalid_request("name must not be empty"));
            }
            user.name = name.to_owned();
        }
        if let Some(password) = update.password {
            validate_new_password(&password).map_err(invalid)?;
            user.password_hash =
                hash_password(&password).map_err(|err| Error::internal(err.to_string()))?;
        }
        user.updated_at = self.clock.utc();
        self.users.update(&user).await?;
        self.resolve(user).await
    }

    async fn resolve(&self, user: User) -> Result<Principal, Error> {
        let group = match user.group_id {
            Some(id) => self
                .groups
                .find_by_id(id)
                .await?
                .filter(|group| !group.is_deleted),
            None => None,
        };
        Ok(Principal::resolve(user, group))
    }
}
