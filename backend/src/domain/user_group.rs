//! User groups: named role bundles with module toggles and a price multiplier.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::permissions::ModuleAccess;

/// Group category; contractor groups are gated by their modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    #[default]
    Standard,
    Contractor,
}

impl GroupType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Contractor => "contractor",
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupType {
    type Err = UserGroupValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "" => Ok(Self::Standard),
            "contractor" => Ok(Self::Contractor),
            _ => Err(UserGroupValidationError::UnknownGroupType(s.to_owned())),
        }
    }
}

/// Price multiplier applied to quotes for members of a group.
///
/// Only applied when `enabled`; a disabled multiplier behaves like `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMultiplier {
    pub value: Decimal,
    pub enabled: bool,
}

impl GroupMultiplier {
    /// Initial multiplier for new groups.
    pub const fn disabled() -> Self {
        Self {
            value: Decimal::ONE,
            enabled: false,
        }
    }

    /// Validate a multiplier update.
    pub fn try_new(value: Decimal, enabled: bool) -> Result<Self, UserGroupValidationError> {
        if value <= Decimal::ZERO {
            return Err(UserGroupValidationError::NonPositiveMultiplier);
        }
        Ok(Self { value, enabled })
    }

    /// Factor to apply to prices: the value when enabled, otherwise one.
    pub fn effective(&self) -> Decimal {
        if self.enabled { self.value } else { Decimal::ONE }
    }
}

/// Validation errors for group payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserGroupValidationError {
    #[error("group name must not be empty")]
    EmptyName,
    #[error("unknown group type: {0}")]
    UnknownGroupType(String),
    #[error("multiplier must be greater than zero")]
    NonPositiveMultiplier,
}

/// Persisted user group.
#[derive(Debug, Clone, PartialEq)]
pub struct UserGroup {
    pub id: Uuid,
    pub name: String,
    pub group_type: GroupType,
    pub modules: ModuleAccess,
    pub multiplier: GroupMultiplier,
    /// Free-form contractor settings (pricing notes, limits) kept as JSON.
    pub contractor_settings: Value,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserGroup {
    pub fn is_contractor(&self) -> bool {
        self.group_type == GroupType::Contractor
    }
}

/// Live membership counts for one group. Soft-deleted rows are excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStats {
    pub users: u64,
    pub customers: u64,
    pub proposals: u64,
}

/// A contractor group with its membership counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractorOverview {
    pub group: UserGroup,
    pub stats: GroupStats,
}

/// Validated fields for creating or updating a group.
#[derive(Debug, Clone, PartialEq)]
pub struct UserGroupDraft {
    pub name: String,
    pub group_type: GroupType,
    pub modules: ModuleAccess,
    pub contractor_settings: Value,
}

impl UserGroupDraft {
    /// Validate raw group fields.
    ///
    /// Standard groups ignore modules; they always receive the standard
    /// permission set.
    pub fn try_new(
        name: &str,
        group_type: &str,
        modules: Option<&Value>,
        contractor_settings: Option<Value>,
    ) -> Result<Self, UserGroupValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(UserGroupValidationError::EmptyName);
        }
        let group_type = GroupType::from_str(group_type)?;
        let modules = match group_type {
            GroupType::Contractor => modules.map(ModuleAccess::from_stored).unwrap_or_default(),
            GroupType::Standard => ModuleAccess::default(),
        };
        Ok(Self {
            name: trimmed.to_owned(),
            group_type,
            modules,
            contractor_settings: contractor_settings.unwrap_or(Value::Null),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[rstest]
    #[case(GroupMultiplier::disabled(), dec!(1))]
    #[case(GroupMultiplier { value: dec!(1.2), enabled: false }, dec!(1))]
    #[case(GroupMultiplier { value: dec!(1.2), enabled: true }, dec!(1.2))]
    fn effective_multiplier(#[case] multiplier: GroupMultiplier, #[case] expected: Decimal) {
        assert_eq!(multiplier.effective(), expected);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1.5))]
    fn multiplier_must_be_positive(#[case] value: Decimal) {
        assert_eq!(
            GroupMultiplier::try_new(value, true),
            Err(UserGroupValidationError::NonPositiveMultiplier)
        );
    }

    #[rstest]
    #[case("contractor", GroupType::Contractor)]
    #[case(" Contractor ", GroupType::Contractor)]
    #[case("standard", GroupType::Standard)]
    #[case("", GroupType::Standard)]
    fn group_type_parsing(#[case] raw: &str, #[case] expected: GroupType) {
        assert_eq!(raw.parse::<GroupType>(), Ok(expected));
    }

    #[rstest]
    fn contractor_draft_keeps_modules() {
        let draft = UserGroupDraft::try_new(
            " Acme Builders ",
            "contractor",
            Some(&json!({"proposals": true})),
            None,
        )
        .expect("valid draft");
        assert_eq!(draft.name, "Acme Builders");
        assert!(draft.modules.proposals);
        assert!(!draft.modules.customers);
    }

    #[rstest]
    fn standard_draft_drops_modules() {
        let draft = UserGroupDraft::try_new("Sales", "standard", Some(&json!({"proposals": true})), None)
            .expect("valid draft");
        assert_eq!(draft.modules, ModuleAccess::default());
    }

    #[rstest]
    fn draft_rejects_blank_name_and_bad_type() {
        assert_eq!(
            UserGroupDraft::try_new(" ", "standard", None, None),
            Err(UserGroupValidationError::EmptyName)
        );
        assert!(matches!(
            UserGroupDraft::try_new("X", "vendor", None, None),
            Err(UserGroupValidationError::UnknownGroupType(_))
        ));
    }
}
