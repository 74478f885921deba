//! Manufacturers, catalog items and assembly costs.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::catalog::{
    AssemblyCost, CatalogFilter, CatalogItem, CatalogItemDraft, ImportSummary,
};
use crate::domain::manufacturer::Manufacturer;
use crate::domain::ports::{
    AssemblyCostTarget, CatalogPersistenceError, CatalogRepository, ManufacturerPersistenceError,
    ManufacturerRepository,
};

use super::{MemoryStore, Tables, paginate};

#[async_trait]
impl ManufacturerRepository for MemoryStore {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Paginated<Manufacturer>, ManufacturerPersistenceError> {
        let tables = self.lock().map_err(ManufacturerPersistenceError::query)?;
        let mut rows: Vec<Manufacturer> = tables.manufacturers.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(rows, page))
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Manufacturer>, ManufacturerPersistenceError> {
        let tables = self.lock().map_err(ManufacturerPersistenceError::query)?;
        Ok(tables.manufacturers.get(&id).cloned())
    }

    async fn insert(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerPersistenceError> {
        let mut tables = self.lock().map_err(ManufacturerPersistenceError::query)?;
        tables
            .manufacturers
            .insert(manufacturer.id, manufacturer.clone());
        Ok(())
    }

    async fn update(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerPersistenceError> {
        let mut tables = self.lock().map_err(ManufacturerPersistenceError::query)?;
        tables
            .manufacturers
            .insert(manufacturer.id, manufacturer.clone());
        Ok(())
    }
}

fn clashes(tables: &Tables, item: &CatalogItem) -> bool {
    tables.catalog.values().any(|other| {
        other.id != item.id
            && other.manufacturer_id == item.manufacturer_id
            && other.code == item.code
            && other.style == item.style
    })
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list(
        &self,
        manufacturer_id: Uuid,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> Result<Paginated<CatalogItem>, CatalogPersistenceError> {
        let tables = self.lock().map_err(CatalogPersistenceError::query)?;
        let mut rows: Vec<CatalogItem> = tables
            .catalog
            .values()
            .filter(|item| item.manufacturer_id == manufacturer_id && filter.matches(item))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.style.cmp(&b.style).then_with(|| a.code.cmp(&b.code)));
        Ok(paginate(rows, page))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CatalogItem>, CatalogPersistenceError> {
        let tables = self.lock().map_err(CatalogPersistenceError::query)?;
        Ok(tables.catalog.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CatalogItem>, CatalogPersistenceError> {
        let tables = self.lock().map_err(CatalogPersistenceError::query)?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.catalog.get(id).cloned())
            .collect())
    }

    async fn insert(&self, item: &CatalogItem) -> Result<(), CatalogPersistenceError> {
        let mut tables = self.lock().map_err(CatalogPersistenceError::query)?;
        if clashes(&tables, item) {
            return Err(CatalogPersistenceError::duplicate_item(
                item.code.as_str(),
                item.style.as_str(),
            ));
        }
        tables.catalog.insert(item.id, item.clone());
        Ok(())
    }

    async fn update(&self, item: &CatalogItem) -> Result<(), CatalogPersistenceError> {
        let mut tables = self.lock().map_err(CatalogPersistenceError::query)?;
        if clashes(&tables, item) {
            return Err(CatalogPersistenceError::duplicate_item(
                item.code.as_str(),
                item.style.as_str(),
            ));
        }
        tables.catalog.insert(item.id, item.clone());
        Ok(())
    }

    async fn import(
        &self,
        manufacturer_id: Uuid,
        rows: &[CatalogItemDraft],
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, CatalogPersistenceError> {
        let mut tables = self.lock().map_err(CatalogPersistenceError::query)?;
        let mut summary = ImportSummary::default();
        for row in rows {
            let existing = tables.catalog.values_mut().find(|item| {
                item.manufacturer_id == manufacturer_id
                    && item.code == row.code
                    && item.style == row.style
            });
            match existing {
                Some(item) => {
                    item.description.clone_from(&row.description);
                    item.item_type.clone_from(&row.item_type);
                    item.price = row.price;
                    item.updated_at = now;
                    summary.updated += 1;
                }
                None => {
                    let item = CatalogItem {
                        id: Uuid::new_v4(),
                        manufacturer_id,
                        code: row.code.clone(),
                        description: row.description.clone(),
                        style: row.style.clone(),
                        item_type: row.item_type.clone(),
                        price: row.price,
                        created_at: now,
                        updated_at: now,
                    };
                    tables.catalog.insert(item.id, item);
                    summary.created += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn styles(&self, manufacturer_id: Uuid) -> Result<Vec<String>, CatalogPersistenceError> {
        let tables = self.lock().map_err(CatalogPersistenceError::query)?;
        let styles: BTreeSet<String> = tables
            .catalog
            .values()
            .filter(|item| item.manufacturer_id == manufacturer_id && !item.style.is_empty())
            .map(|item| item.style.clone())
            .collect();
        Ok(styles.into_iter().collect())
    }

    async fn assembly_costs(
        &self,
        item_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, AssemblyCost)>, CatalogPersistenceError> {
        let tables = self.lock().map_err(CatalogPersistenceError::query)?;
        Ok(item_ids
            .iter()
            .filter_map(|id| tables.assembly_costs.get(id).map(|cost| (*id, *cost)))
            .collect())
    }

    async fn set_assembly_cost(
        &self,
        target: AssemblyCostTarget,
        cost: AssemblyCost,
    ) -> Result<u64, CatalogPersistenceError> {
        let mut tables = self.lock().map_err(CatalogPersistenceError::query)?;
        let ids: Vec<Uuid> = match target {
            AssemblyCostTarget::Item(id) => tables
                .catalog
                .contains_key(&id)
                .then_some(id)
                .into_iter()
                .collect(),
            AssemblyCostTarget::Manufacturer(manufacturer_id) => tables
                .catalog
                .values()
                .filter(|item| item.manufacturer_id == manufacturer_id)
                .map(|item| item.id)
                .collect(),
        };
        for id in &ids {
            tables.assembly_costs.insert(*id, cost);
        }
        Ok(ids.len() as u64)
    }
}
