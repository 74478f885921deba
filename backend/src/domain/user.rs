//! User accounts, identifiers and role normalisation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised by user value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("name must not be empty")]
    EmptyName,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must look like local@domain")]
    InvalidEmail,
}

/// Stable user identifier.
///
/// # Examples
/// ```
/// use cabinet_backend::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("uuid");
/// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its textual form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Normalised email address: trimmed and lower-cased.
///
/// Lookups are case-insensitive, so every email is stored in this form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        match normalised.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(normalised))
            }
            _ => Err(UserValidationError::InvalidEmail),
        }
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Role category derived from the free-form role string stored on a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Unrestricted administrator. Covers the historical `super admin` and
    /// `manufacturer` spellings, which were granted the same access.
    Admin,
    /// Contractor account whose access is driven by group modules.
    Contractor,
    /// Any other role label; kept verbatim for display.
    Standard(String),
}

const ADMIN_ROLE_LABELS: &[&str] = &[
    "admin",
    "super_admin",
    "superadmin",
    "super admin",
    "manufacturers",
    "manufacturer",
];

impl Role {
    /// Classify a stored role label. Matching is trimmed and case-insensitive.
    ///
    /// # Examples
    /// ```
    /// use cabinet_backend::domain::Role;
    ///
    /// assert_eq!(Role::parse(" Super Admin "), Role::Admin);
    /// assert_eq!(Role::parse("contractor"), Role::Contractor);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let normalised = raw.trim().to_lowercase();
        if ADMIN_ROLE_LABELS.contains(&normalised.as_str()) {
            Self::Admin
        } else if normalised == "contractor" {
            Self::Contractor
        } else {
            Self::Standard(raw.trim().to_owned())
        }
    }

    /// Whether the role grants every permission.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Persisted user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: EmailAddress,
    /// Free-form role label as stored; see [`Role::parse`].
    pub role: String,
    pub group_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub password_hash: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Role category for permission resolution.
    pub fn role_kind(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// Validated fields for creating or replacing a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: EmailAddress,
    pub role: String,
    pub group_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

impl UserDraft {
    /// Validate raw user fields.
    pub fn try_new(
        name: &str,
        email: &str,
        role: Option<&str>,
        group_id: Option<Uuid>,
        location_id: Option<Uuid>,
    ) -> Result<Self, UserValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            email: EmailAddress::new(email)?,
            role: role.map(str::trim).unwrap_or_default().to_owned(),
            group_id,
            location_id,
        })
    }
}
