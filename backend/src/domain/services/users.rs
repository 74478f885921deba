//! Administration of user accounts.

use std::sync::Arc;

use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;

use crate::domain::auth::{hash_password, validate_new_password};
use crate::domain::ports::{UserGroupRepository, UserRepository};
use crate::domain::user::UserDraft;
use crate::domain::user_group::UserGroup;
use crate::domain::{Error, Permission, Principal, User, UserId};

use super::{found, invalid};

/// Replacement fields for an existing user. The password is only re-hashed
/// when supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub draft: UserDraft,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn UserGroupRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn UserGroupRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            groups,
            clock,
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> Result<Paginated<User>, Error> {
        principal.require(Permission::AdminUsers)?;
        Ok(self.users.list(page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: &UserId) -> Result<User, Error> {
        principal.require(Permission::AdminUsers)?;
        self.live(id).await
    }

    /// Create a user. A soft-deleted account with the same email is restored
    /// with the new details instead of failing as a duplicate.
    pub async fn create(
        &self,
        principal: &Principal,
        draft: UserDraft,
        password: &str,
    ) -> Result<User, Error> {
        principal.require(Permission::AdminUsers)?;
        validate_new_password(password).map_err(invalid)?;
        let group = self.group(draft.group_id).await?;
        let password_hash = hash(password)?;
        let now = self.clock.utc();

        match self.users.find_by_email(&draft.email).await? {
            Some(existing) if !existing.is_deleted => Err(Error::invalid_request(
                "a user with this email already exists",
            )),
            Some(mut restored) => {
                apply_draft(&mut restored, draft, group.as_ref());
                restored.password_hash = password_hash;
                restored.is_deleted = false;
                restored.updated_at = now;
                self.users.update(&restored).await?;
                info!(user_id = %restored.id, "restored deleted user");
                Ok(restored)
            }
            None => {
                let mut user = User {
                    id: UserId::random(),
                    name: String::new(),
                    email: draft.email.clone(),
                    role: String::new(),
                    group_id: None,
                    location_id: None,
                    password_hash,
                    is_deleted: false,
                    created_at: now,
                    updated_at: now,
                };
                apply_draft(&mut user, draft, group.as_ref());
                self.users.insert(&user).await?;
                info!(user_id = %user.id, "user created");
                Ok(user)
            }
        }
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &UserId,
        update: UserUpdate,
    ) -> Result<User, Error> {
        principal.require(Permission::AdminUsers)?;
        let mut user = self.live(id).await?;
        if update.draft.email != user.email {
            if let Some(other) = self.users.find_by_email(&update.draft.email).await? {
                if other.id != user.id {
                    return Err(Error::invalid_request(
                        "a user with this email already exists",
                    ));
                }
            }
        }
        let group = self.group(update.draft.group_id).await?;
        if let Some(password) = update.password.as_deref() {
            validate_new_password(password).map_err(invalid)?;
            user.password_hash = hash(password)?;
        }
        apply_draft(&mut user, update.draft, group.as_ref());
        user.updated_at = self.clock.utc();
        self.users.update(&user).await?;
        Ok(user)
    }

    /// Soft-delete a user. Administrators cannot delete themselves.
    pub async fn delete(&self, principal: &Principal, id: &UserId) -> Result<(), Error> {
        principal.require(Permission::AdminUsers)?;
        if principal.user_id() == *id {
            return Err(Error::invalid_request("you cannot delete your own account"));
        }
        let mut user = self.live(id).await?;
        user.is_deleted = true;
        user.updated_at = self.clock.utc();
        self.users.update(&user).await?;
        info!(user_id = %user.id, "user deleted");
        Ok(())
    }

    async fn live(&self, id: &UserId) -> Result<User, Error> {
        found(
            self.users.find_by_id(id).await?.filter(|u| !u.is_deleted),
            "user",
        )
    }

    async fn group(&self, id: Option<uuid::Uuid>) -> Result<Option<UserGroup>, Error> {
        let Some(id) = id else {
            return Ok(None);
        };
        self.groups
            .find_by_id(id)
            .await?
            .filter(|g| !g.is_deleted)
            .map(Some)
            .ok_or_else(|| Error::invalid_request("unknown user group"))
    }
}

fn hash(password: &str) -> Result<String, Error> {
    hash_password(password).map_err(|err| Error::internal(err.to_string()))
}

/// Copy draft fields onto a user. A blank role defaults from the group:
/// `Contractor` for contractor groups, `User` otherwise.
fn apply_draft(user: &mut User, draft: UserDraft, group: Option<&UserGroup>) {
    user.role = if draft.role.is_empty() {
        match group {
            Some(g) if g.is_contractor() => "Contractor".to_owned(),
            _ => "User".to_owned(),
        }
    } else {
        draft.role
    };
    user.name = draft.name;
    user.email = draft.email;
    user.group_id = draft.group_id;
    user.location_id = draft.location_id;
}
