//! Manufacturers and their cost multipliers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Validation errors for manufacturer payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManufacturerValidationError {
    #[error("manufacturer name must not be empty")]
    EmptyName,
    #[error("cost multiplier must be greater than zero")]
    NonPositiveMultiplier,
}

/// Persisted manufacturer.
#[derive(Debug, Clone, PartialEq)]
pub struct Manufacturer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    /// Factor applied to every catalog price quoted for this manufacturer.
    pub cost_multiplier: Decimal,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated manufacturer fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ManufacturerDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub cost_multiplier: Decimal,
    pub instructions: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Raw manufacturer input before validation.
#[derive(Debug, Clone, Default)]
pub struct ManufacturerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub cost_multiplier: Option<Decimal>,
    pub instructions: Option<String>,
}

impl ManufacturerDraft {
    /// Validate raw input. A missing multiplier defaults to `1`.
    pub fn try_new(input: ManufacturerInput) -> Result<Self, ManufacturerValidationError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ManufacturerValidationError::EmptyName);
        }
        let cost_multiplier = input.cost_multiplier.unwrap_or(Decimal::ONE);
        if cost_multiplier <= Decimal::ZERO {
            return Err(ManufacturerValidationError::NonPositiveMultiplier);
        }
        Ok(Self {
            name: name.to_owned(),
            email: non_blank(input.email),
            phone: non_blank(input.phone),
            address: non_blank(input.address),
            website: non_blank(input.website),
            cost_multiplier,
            instructions: non_blank(input.instructions),
        })
    }
}
