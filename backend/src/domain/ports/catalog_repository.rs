//! Port for manufacturer catalog persistence.
//!
//! Catalog items are unique per `(manufacturer_id, code, style)`. Imports
//! upsert on that key so re-importing a price list updates prices in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::catalog::{
    AssemblyCost, CatalogFilter, CatalogItem, CatalogItemDraft, ImportSummary,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalog repository adapters.
    pub enum CatalogPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "catalog repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "catalog repository query failed: {message}",
        /// Another item already uses the code within the style.
        DuplicateItem { code: String, style: String } =>
            "catalog item {code} already exists in style {style}",
    }
}

impl From<CatalogPersistenceError> for Error {
    fn from(error: CatalogPersistenceError) -> Self {
        match error {
            CatalogPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("catalog repository unavailable: {message}"))
            }
            CatalogPersistenceError::Query { message } => {
                Self::internal(format!("catalog repository error: {message}"))
            }
            CatalogPersistenceError::DuplicateItem { code, style } => {
                Self::conflict(format!("item {code} already exists in style {style}"))
            }
        }
    }
}

/// Items an assembly cost is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyCostTarget {
    Item(Uuid),
    /// Every item of a manufacturer.
    Manufacturer(Uuid),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Page through a manufacturer's items ordered by style then code.
    async fn list(
        &self,
        manufacturer_id: Uuid,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> Result<Paginated<CatalogItem>, CatalogPersistenceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CatalogItem>, CatalogPersistenceError>;

    /// Fetch several items at once; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CatalogItem>, CatalogPersistenceError>;

    async fn insert(&self, item: &CatalogItem) -> Result<(), CatalogPersistenceError>;

    async fn update(&self, item: &CatalogItem) -> Result<(), CatalogPersistenceError>;

    /// Upsert rows by `(code, style)` within one manufacturer, atomically.
    async fn import(
        &self,
        manufacturer_id: Uuid,
        rows: &[CatalogItemDraft],
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, CatalogPersistenceError>;

    /// Distinct style names of a manufacturer, sorted.
    async fn styles(&self, manufacturer_id: Uuid) -> Result<Vec<String>, CatalogPersistenceError>;

    /// Assembly costs configured for the given items.
    async fn assembly_costs(
        &self,
        item_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, AssemblyCost)>, CatalogPersistenceError>;

    /// Replace the assembly cost of the targeted items, returning how many
    /// items were written.
    async fn set_assembly_cost(
        &self,
        target: AssemblyCostTarget,
        cost: AssemblyCost,
    ) -> Result<u64, CatalogPersistenceError>;
}
