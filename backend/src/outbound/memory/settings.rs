//! Locations, taxes and resource links.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{
    LocationRepository, ResourcePersistenceError, ResourceRepository, SettingsPersistenceError,
    TaxRepository,
};
use crate::domain::resources::ResourceLink;
use crate::domain::settings::{Location, Tax};

use super::MemoryStore;

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Location>, SettingsPersistenceError> {
        let tables = self.lock().map_err(SettingsPersistenceError::query)?;
        let mut rows: Vec<Location> = tables.locations.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, SettingsPersistenceError> {
        let tables = self.lock().map_err(SettingsPersistenceError::query)?;
        Ok(tables.locations.get(&id).cloned())
    }

    async fn insert(&self, location: &Location) -> Result<(), SettingsPersistenceError> {
        let mut tables = self.lock().map_err(SettingsPersistenceError::query)?;
        tables.locations.insert(location.id, location.clone());
        Ok(())
    }

    async fn update(&self, location: &Location) -> Result<(), SettingsPersistenceError> {
        let mut tables = self.lock().map_err(SettingsPersistenceError::query)?;
        tables.locations.insert(location.id, location.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SettingsPersistenceError> {
        let mut tables = self.lock().map_err(SettingsPersistenceError::query)?;
        Ok(tables.locations.remove(&id).is_some())
    }
}

#[async_trait]
impl TaxRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Tax>, SettingsPersistenceError> {
        let tables = self.lock().map_err(SettingsPersistenceError::query)?;
        let mut rows = tables.taxes.clone();
        rows.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    async fn insert(&self, tax: &Tax) -> Result<(), SettingsPersistenceError> {
        let mut tables = self.lock().map_err(SettingsPersistenceError::query)?;
        if tax.is_default {
            for other in &mut tables.taxes {
                other.is_default = false;
            }
        }
        tables.taxes.push(tax.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SettingsPersistenceError> {
        let mut tables = self.lock().map_err(SettingsPersistenceError::query)?;
        let before = tables.taxes.len();
        tables.taxes.retain(|t| t.id != id);
        Ok(tables.taxes.len() != before)
    }

    async fn set_default(&self, id: Uuid) -> Result<bool, SettingsPersistenceError> {
        let mut tables = self.lock().map_err(SettingsPersistenceError::query)?;
        if !tables.taxes.iter().any(|t| t.id == id) {
            return Ok(false);
        }
        for tax in &mut tables.taxes {
            tax.is_default = tax.id == id;
        }
        Ok(true)
    }
}

#[async_trait]
impl ResourceRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<ResourceLink>, ResourcePersistenceError> {
        let tables = self.lock().map_err(ResourcePersistenceError::query)?;
        let mut rows: Vec<ResourceLink> = tables.resources.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ResourceLink>, ResourcePersistenceError> {
        let tables = self.lock().map_err(ResourcePersistenceError::query)?;
        Ok(tables.resources.get(&id).cloned())
    }

    async fn insert(&self, link: &ResourceLink) -> Result<(), ResourcePersistenceError> {
        let mut tables = self.lock().map_err(ResourcePersistenceError::query)?;
        tables.resources.insert(link.id, link.clone());
        Ok(())
    }

    async fn update(&self, link: &ResourceLink) -> Result<(), ResourcePersistenceError> {
        let mut tables = self.lock().map_err(ResourcePersistenceError::query)?;
        tables.resources.insert(link.id, link.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ResourcePersistenceError> {
        let mut tables = self.lock().map_err(ResourcePersistenceError::query)?;
        Ok(tables.resources.remove(&id).is_some())
    }
}
