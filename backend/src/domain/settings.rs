//! Business settings: showroom locations and tax rates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Validation errors for settings payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsValidationError {
    #[error("location name must not be empty")]
    EmptyLocationName,
    #[error("tax label must not be empty")]
    EmptyTaxLabel,
    #[error("tax rate must be between 0 and 100")]
    TaxOutOfRange,
}

/// A showroom or office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// IANA zone name, e.g. `America/New_York`.
    pub time_zone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated location fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDraft {
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub time_zone: Option<String>,
}

impl LocationDraft {
    pub fn try_new(
        name: &str,
        address: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        website: Option<String>,
        time_zone: Option<String>,
    ) -> Result<Self, SettingsValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SettingsValidationError::EmptyLocationName);
        }
        let clean = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        Ok(Self {
            name: name.to_owned(),
            address: clean(address),
            email: clean(email),
            phone: clean(phone),
            website: clean(website),
            time_zone: clean(time_zone),
        })
    }
}

/// A tax rate. At most one tax is the default at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tax {
    pub id: Uuid,
    pub label: String,
    /// Percentage, `0..=100`.
    pub value: Decimal,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated tax fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxDraft {
    pub label: String,
    pub value: Decimal,
}

impl TaxDraft {
    pub fn try_new(label: &str, value: Decimal) -> Result<Self, SettingsValidationError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SettingsValidationError::EmptyTaxLabel);
        }
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(SettingsValidationError::TaxOutOfRange);
        }
        Ok(Self {
            label: label.to_owned(),
            value,
        })
    }
}

/// Tax percentage to apply when a quote does not name one.
pub fn default_tax_rate(taxes: &[Tax]) -> Decimal {
    taxes
        .iter()
        .find(|t| t.is_default)
        .map_or(Decimal::ZERO, |t| t.value)
}
