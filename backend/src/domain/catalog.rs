//! Manufacturer catalog items and per-item assembly costs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for catalog payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogValidationError {
    #[error("catalog code must not be empty")]
    EmptyCode,
    #[error("catalog price must not be negative")]
    NegativePrice,
    #[error("assembly cost must not be negative")]
    NegativeAssemblyCost,
    #[error("import contains no rows")]
    EmptyImport,
    #[error("import row {row}: {reason}")]
    InvalidImportRow { row: usize, reason: String },
}

/// A priced catalog entry. `(manufacturer_id, code, style)` is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: Uuid,
    pub manufacturer_id: Uuid,
    pub code: String,
    pub description: Option<String>,
    /// Empty string when the item is not tied to a style.
    pub style: String,
    pub item_type: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated catalog fields, used by manual edits and imports alike.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItemDraft {
    pub code: String,
    pub description: Option<String>,
    pub style: String,
    pub item_type: Option<String>,
    pub price: Decimal,
}

impl CatalogItemDraft {
    /// Validate one catalog entry.
    pub fn try_new(
        code: &str,
        description: Option<&str>,
        style: Option<&str>,
        item_type: Option<&str>,
        price: Decimal,
    ) -> Result<Self, CatalogValidationError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CatalogValidationError::EmptyCode);
        }
        if price < Decimal::ZERO {
            return Err(CatalogValidationError::NegativePrice);
        }
        let clean = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned);
        Ok(Self {
            code: code.to_owned(),
            description: clean(description),
            style: style.map(str::trim).unwrap_or_default().to_owned(),
            item_type: clean(item_type),
            price,
        })
    }

    /// Natural key used for upserts.
    pub fn key(&self) -> (&str, &str) {
        (&self.code, &self.style)
    }
}

/// Validate a batch of import rows. Row numbers in errors are one-based.
pub fn validate_import<I>(rows: I) -> Result<Vec<CatalogItemDraft>, CatalogValidationError>
where
    I: IntoIterator<Item = Result<CatalogItemDraft, CatalogValidationError>>,
{
    let drafts = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|err| CatalogValidationError::InvalidImportRow {
                row: idx + 1,
                reason: err.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if drafts.is_empty() {
        return Err(CatalogValidationError::EmptyImport);
    }
    Ok(drafts)
}

/// Outcome of a bulk catalog import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: u64,
    pub updated: u64,
}

/// How an assembly fee is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyCostKind {
    /// Fixed amount per unit.
    #[default]
    Flat,
    /// Percentage of the multiplied unit price.
    Percentage,
}

impl AssemblyCostKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Percentage => "percentage",
        }
    }

    /// Interpret a stored kind. `fixed`, blanks and unknown labels are flat.
    pub fn from_stored(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "percentage" | "percent" => Self::Percentage,
            _ => Self::Flat,
        }
    }
}

impl fmt::Display for AssemblyCostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssemblyCostKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_stored(s))
    }
}

/// Assembly fee configured for a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyCost {
    pub kind: AssemblyCostKind,
    pub amount: Decimal,
}

impl AssemblyCost {
    pub fn try_new(kind: AssemblyCostKind, amount: Decimal) -> Result<Self, CatalogValidationError> {
        if amount < Decimal::ZERO {
            return Err(CatalogValidationError::NegativeAssemblyCost);
        }
        Ok(Self { kind, amount })
    }
}

/// Which items an assembly cost update targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyCostScope {
    /// Only the addressed item.
    #[default]
    One,
    /// Every catalog item of the item's manufacturer.
    Manufacturer,
}

/// Catalog list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub style: Option<String>,
    /// Case-insensitive substring match on code or description.
    pub search: Option<String>,
}

impl CatalogFilter {
    /// Whether an item passes the filter.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        let style_ok = self
            .style
            .as_deref()
            .is_none_or(|style| item.style.eq_ignore_ascii_case(style));
        let search_ok = self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            item.code.to_lowercase().contains(&needle)
                || item
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        });
        style_ok && search_ok
    }
}
