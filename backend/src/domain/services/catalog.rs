//! Manufacturers, their catalogs and assembly costs.

use std::sync::Arc;

use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::info;
use uuid::Uuid;

use crate::domain::catalog::{
    AssemblyCost, AssemblyCostScope, CatalogFilter, CatalogItem, CatalogItemDraft, ImportSummary,
};
use crate::domain::manufacturer::{Manufacturer, ManufacturerDraft};
use crate::domain::ports::{AssemblyCostTarget, CatalogRepository, ManufacturerRepository};
use crate::domain::{Error, Permission, Principal};

use super::found;

/// Reads are open to every signed-in user; writes need
/// `admin:manufacturers`.
#[derive(Clone)]
pub struct CatalogService {
    manufacturers: Arc<dyn ManufacturerRepository>,
    catalog: Arc<dyn CatalogRepository>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(
        manufacturers: Arc<dyn ManufacturerRepository>,
        catalog: Arc<dyn CatalogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            manufacturers,
            catalog,
            clock,
        }
    }

    pub async fn list_manufacturers(
        &self,
        page: PageRequest,
    ) -> Result<Paginated<Manufacturer>, Error> {
        Ok(self.manufacturers.list(page).await?)
    }

    pub async fn manufacturer(&self, id: Uuid) -> Result<Manufacturer, Error> {
        found(self.manufacturers.find_by_id(id).await?, "manufacturer")
    }

    pub async fn create_manufacturer(
        &self,
        principal: &Principal,
        draft: ManufacturerDraft,
    ) -> Result<Manufacturer, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let now = self.clock.utc();
        let manufacturer = Manufacturer {
            id: Uuid::new_v4(),
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            website: draft.website,
            is_active: true,
            cost_multiplier: draft.cost_multiplier,
            instructions: draft.instructions,
            created_at: now,
            updated_at: now,
        };
        self.manufacturers.insert(&manufacturer).await?;
        info!(manufacturer_id = %manufacturer.id, "manufacturer created");
        Ok(manufacturer)
    }

    pub async fn update_manufacturer(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: ManufacturerDraft,
    ) -> Result<Manufacturer, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let mut manufacturer = self.manufacturer(id).await?;
        manufacturer.name = draft.name;
        manufacturer.email = draft.email;
        manufacturer.phone = draft.phone;
        manufacturer.address = draft.address;
        manufacturer.website = draft.website;
        manufacturer.cost_multiplier = draft.cost_multiplier;
        manufacturer.instructions = draft.instructions;
        manufacturer.updated_at = self.clock.utc();
        self.manufacturers.update(&manufacturer).await?;
        Ok(manufacturer)
    }

    pub async fn set_manufacturer_status(
        &self,
        principal: &Principal,
        id: Uuid,
        is_active: bool,
    ) -> Result<Manufacturer, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let mut manufacturer = self.manufacturer(id).await?;
        manufacturer.is_active = is_active;
        manufacturer.updated_at = self.clock.utc();
        self.manufacturers.update(&manufacturer).await?;
        info!(manufacturer_id = %id, is_active, "manufacturer status changed");
        Ok(manufacturer)
    }

    pub async fn list_items(
        &self,
        manufacturer_id: Uuid,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> Result<Paginated<CatalogItem>, Error> {
        self.manufacturer(manufacturer_id).await?;
        Ok(self.catalog.list(manufacturer_id, filter, page).await?)
    }

    pub async fn create_item(
        &self,
        principal: &Principal,
        manufacturer_id: Uuid,
        draft: CatalogItemDraft,
    ) -> Result<CatalogItem, Error> {
        principal.require(Permission::AdminManufacturers)?;
        self.manufacturer(manufacturer_id).await?;
        let now = self.clock.utc();
        let item = CatalogItem {
            id: Uuid::new_v4(),
            manufacturer_id,
            code: draft.code,
            description: draft.description,
            style: draft.style,
            item_type: draft.item_type,
            price: draft.price,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert(&item).await?;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        principal: &Principal,
        item_id: Uuid,
        draft: CatalogItemDraft,
    ) -> Result<CatalogItem, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let mut item = found(self.catalog.find_by_id(item_id).await?, "catalog item")?;
        item.code = draft.code;
        item.description = draft.description;
        item.style = draft.style;
        item.item_type = draft.item_type;
        item.price = draft.price;
        item.updated_at = self.clock.utc();
        self.catalog.update(&item).await?;
        Ok(item)
    }

    /// Upsert validated rows into a manufacturer's catalog.
    pub async fn import(
        &self,
        principal: &Principal,
        manufacturer_id: Uuid,
        rows: Vec<CatalogItemDraft>,
    ) -> Result<ImportSummary, Error> {
        principal.require(Permission::AdminManufacturers)?;
        if rows.is_empty() {
            return Err(Error::invalid_request("import contains no rows"));
        }
        self.manufacturer(manufacturer_id).await?;
        let summary = self
            .catalog
            .import(manufacturer_id, &rows, self.clock.utc())
            .await?;
        info!(
            manufacturer_id = %manufacturer_id,
            created = summary.created,
            updated = summary.updated,
            "catalog imported"
        );
        Ok(summary)
    }

    pub async fn styles(&self, manufacturer_id: Uuid) -> Result<Vec<String>, Error> {
        self.manufacturer(manufacturer_id).await?;
        Ok(self.catalog.styles(manufacturer_id).await?)
    }

    /// Assembly cost of an item, if one is configured.
    pub async fn assembly_cost(&self, item_id: Uuid) -> Result<Option<AssemblyCost>, Error> {
        found(self.catalog.find_by_id(item_id).await?, "catalog item")?;
        let costs = self.catalog.assembly_costs(&[item_id]).await?;
        Ok(costs
            .into_iter()
            .find_map(|(id, cost)| (id == item_id).then_some(cost)))
    }

    /// Set the assembly cost of one item, or of every item of its
    /// manufacturer. Returns the number of items updated.
    pub async fn set_assembly_cost(
        &self,
        principal: &Principal,
        item_id: Uuid,
        cost: AssemblyCost,
        scope: AssemblyCostScope,
    ) -> Result<u64, Error> {
        principal.require(Permission::AdminManufacturers)?;
        let item = found(self.catalog.find_by_id(item_id).await?, "catalog item")?;
        let target = match scope {
            AssemblyCostScope::One => AssemblyCostTarget::Item(item.id),
            AssemblyCostScope::Manufacturer => {
                AssemblyCostTarget::Manufacturer(item.manufacturer_id)
            }
        };
        Ok(self.catalog.set_assembly_cost(target, cost).await?)
    }
}
