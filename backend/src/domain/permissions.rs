//! Permission catalogue and module gating.
//!
//! Permissions are resolved once per request from the user's role label and
//! the group they belong to:
//!
//! - admin-like roles receive every permission;
//! - members of a contractor group receive the permissions unlocked by the
//!   group's module toggles;
//! - everyone else receives the standard set (no `admin:*`).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::user::Role;
use crate::domain::user_group::{GroupType, UserGroup};
use crate::domain::Error;

macro_rules! permissions {
    ($($variant:ident => $label:literal),* $(,)?) => {
        /// Every permission the API checks.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Permission {
            $(
                #[doc = concat!("`", $label, "`")]
                $variant,
            )*
        }

        impl Permission {
            /// All permissions in declaration order.
            pub const ALL: &'static [Permission] = &[$(Permission::$variant),*];

            /// Wire label such as `proposals:read`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Permission::$variant => $label,)*
                }
            }
        }

        impl FromStr for Permission {
            type Err = UnknownPermission;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Permission::$variant),)*
                    other => Err(UnknownPermission(other.to_owned())),
                }
            }
        }
    };
}

permissions! {
    AdminUsers => "admin:users",
    AdminGroups => "admin:groups",
    AdminRoles => "admin:roles",
    AdminManufacturers => "admin:manufacturers",
    AdminSettings => "admin:settings",
    AdminReports => "admin:reports",
    AdminSystem => "admin:system",
    ContractorsRead => "contractors:read",
    ProposalsRead => "proposals:read",
    ProposalsCreate => "proposals:create",
    ProposalsUpdate => "proposals:update",
    ProposalsDelete => "proposals:delete",
    ProposalsAccept => "proposals:accept",
    CustomersRead => "customers:read",
    CustomersCreate => "customers:create",
    CustomersUpdate => "customers:update",
    CustomersDelete => "customers:delete",
    ResourcesRead => "resources:read",
    ResourcesCreate => "resources:create",
    ResourcesUpdate => "resources:update",
    ResourcesDelete => "resources:delete",
    PaymentsRead => "payments:read",
    PaymentsCreate => "payments:create",
    PaymentsUpdate => "payments:update",
    PaymentsDelete => "payments:delete",
}

/// Raised when parsing an unknown permission label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

use Permission::*;

const STANDARD_SET: &[Permission] = &[
    ContractorsRead,
    ProposalsRead,
    ProposalsCreate,
    ProposalsUpdate,
    ProposalsDelete,
    ProposalsAccept,
    CustomersRead,
    CustomersCreate,
    CustomersUpdate,
    CustomersDelete,
    ResourcesRead,
    ResourcesCreate,
    ResourcesUpdate,
    ResourcesDelete,
    PaymentsRead,
    PaymentsCreate,
    PaymentsUpdate,
    PaymentsDelete,
];

const DASHBOARD_MODULE: &[Permission] = &[ContractorsRead];
const PROPOSALS_MODULE: &[Permission] = &[
    ProposalsRead,
    ProposalsCreate,
    ProposalsUpdate,
    ProposalsAccept,
];
const CUSTOMERS_MODULE: &[Permission] = &[
    CustomersRead,
    CustomersCreate,
    CustomersUpdate,
    CustomersDelete,
];
const RESOURCES_MODULE: &[Permission] = &[ResourcesRead];

/// Module toggles stored on a contractor group.
///
/// Stored as a JSON object; some rows hold the object JSON-encoded as a
/// string. Anything that does not parse grants nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleAccess {
    pub dashboard: bool,
    pub proposals: bool,
    pub customers: bool,
    pub resources: bool,
}

impl ModuleAccess {
    /// Every module enabled.
    pub const fn all() -> Self {
        Self {
            dashboard: true,
            proposals: true,
            customers: true,
            resources: true,
        }
    }

    /// Parse a stored `modules` column value.
    ///
    /// # Examples
    /// ```
    /// use cabinet_backend::domain::ModuleAccess;
    /// use serde_json::json;
    ///
    /// let parsed = ModuleAccess::from_stored(&json!("{\"proposals\":true}"));
    /// assert!(parsed.proposals);
    /// assert!(!ModuleAccess::from_stored(&json!("garbage")).dashboard);
    /// ```
    pub fn from_stored(value: &Value) -> Self {
        let parsed = match value {
            Value::String(raw) => serde_json::from_str::<Self>(raw),
            Value::Null => return Self::default(),
            other => serde_json::from_value::<Self>(other.clone()),
        };
        parsed.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "unparsable group modules; denying all modules");
            Self::default()
        })
    }

    fn granted(self) -> impl Iterator<Item = Permission> {
        [
            (self.dashboard, DASHBOARD_MODULE),
            (self.proposals, PROPOSALS_MODULE),
            (self.customers, CUSTOMERS_MODULE),
            (self.resources, RESOURCES_MODULE),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .flat_map(|(_, perms)| perms.iter().copied())
    }
}

/// Effective permission set of a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Resolve permissions for a role label and optional group.
    pub fn resolve(role: &Role, group: Option<&UserGroup>) -> Self {
        if role.is_admin() {
            return Self(Permission::ALL.iter().copied().collect());
        }
        match group {
            Some(group) if group.group_type == GroupType::Contractor => {
                Self(group.modules.granted().collect())
            }
            _ => Self(STANDARD_SET.iter().copied().collect()),
        }
    }

    /// Whether the set contains `permission`.
    pub fn has(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Whether the set contains at least one of `permissions`.
    pub fn has_any(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has(*p))
    }

    /// Whether the set contains every one of `permissions`.
    pub fn has_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has(*p))
    }

    /// Fail with `403` unless `permission` is present.
    pub fn require(&self, permission: Permission) -> Result<(), Error> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(Error::forbidden(format!("missing permission {permission}"))
                .with_details(serde_json::json!({ "required": permission.as_str() })))
        }
    }

    /// Fail with `403` unless at least one of `permissions` is present.
    pub fn require_any(&self, permissions: &[Permission]) -> Result<(), Error> {
        if self.has_any(permissions) {
            Ok(())
        } else {
            let labels: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
            Err(Error::forbidden("missing permission")
                .with_details(serde_json::json!({ "requiredAny": labels })))
        }
    }

    /// Iterate in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
