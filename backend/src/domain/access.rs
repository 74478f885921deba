//! Authenticated principal and group-scoped data access.
//!
//! Contractors only see and modify records owned by their own group; every
//! other principal is unrestricted. Services call the helpers here before
//! touching a record so the rule is enforced in one place.

use uuid::Uuid;

use crate::domain::permissions::{Permission, PermissionSet};
use crate::domain::user::{Role, User};
use crate::domain::user_group::UserGroup;
use crate::domain::{Error, UserId};

/// Visibility of group-owned records for a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// May access every record.
    Unrestricted,
    /// May only access records owned by this group.
    Group(Uuid),
}

impl AccessScope {
    /// Group filter to apply to list queries, if any.
    pub fn group_filter(&self) -> Option<Uuid> {
        match self {
            Self::Unrestricted => None,
            Self::Group(id) => Some(*id),
        }
    }

    /// Owner group to stamp on a record created by this principal.
    ///
    /// Scoped principals always create records in their own group; others may
    /// choose (or leave it unset).
    pub fn owner_for_new(&self, requested: Option<Uuid>) -> Option<Uuid> {
        match self {
            Self::Unrestricted => requested,
            Self::Group(id) => Some(*id),
        }
    }

    /// Check that an existing record owned by `owner` is visible.
    pub fn ensure_visible(&self, owner: Option<Uuid>, resource: &str) -> Result<(), Error> {
        match self {
            Self::Unrestricted => Ok(()),
            Self::Group(id) if owner == Some(*id) => Ok(()),
            Self::Group(_) => Err(Error::forbidden(format!(
                "{resource} belongs to another group"
            ))),
        }
    }

    /// Reject payloads that try to move a record to another group.
    pub fn ensure_owner_unchanged(
        &self,
        current: Option<Uuid>,
        requested: Option<Uuid>,
    ) -> Result<(), Error> {
        match (self, requested) {
            (Self::Group(_), Some(new_owner)) if Some(new_owner) != current => Err(
                Error::forbidden("cannot change group ownership"),
            ),
            _ => Ok(()),
        }
    }
}

/// The authenticated caller with resolved permissions.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub group: Option<UserGroup>,
    pub permissions: PermissionSet,
    pub scope: AccessScope,
}

impl Principal {
    /// Resolve permissions and scope for a user and their group.
    pub fn resolve(user: User, group: Option<UserGroup>) -> Self {
        let role = user.role_kind();
        let permissions = PermissionSet::resolve(&role, group.as_ref());
        let scope = match (&role, &group) {
            (Role::Admin, _) => AccessScope::Unrestricted,
            (_, Some(g)) if g.is_contractor() => AccessScope::Group(g.id),
            _ => AccessScope::Unrestricted,
        };
        Self {
            user,
            group,
            permissions,
            scope,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role_kind().is_admin()
    }

    /// Shorthand for [`PermissionSet::require`].
    pub fn require(&self, permission: Permission) -> Result<(), Error> {
        self.permissions.require(permission)
    }

    /// Role label reported to clients.
    ///
    /// Members of a contractor group whose stored role is blank are reported
    /// as `Contractor`.
    pub fn display_role(&self) -> String {
        let stored = self.user.role.trim();
        match &self.group {
            Some(g) if g.is_contractor() && stored.is_empty() => "Contractor".to_owned(),
            _ => stored.to_owned(),
        }
    }

    /// Active group multiplier, `1` when the principal has no group.
    pub fn group_multiplier(&self) -> rust_decimal::Decimal {
        self.group
            .as_ref()
            .map_or(rust_decimal::Decimal::ONE, |g| g.multiplier.effective())
    }
}
