//! Locations and tax rates.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{LocationRepository, TaxRepository};
use crate::domain::settings::{Location, LocationDraft, Tax, TaxDraft};
use crate::domain::{Error, Permission, Principal};

use super::found;

#[derive(Clone)]
pub struct SettingsService {
    locations: Arc<dyn LocationRepository>,
    taxes: Arc<dyn TaxRepository>,
    clock: Arc<dyn Clock>,
}

impl SettingsService {
    pub fn new(
        locations: Arc<dyn LocationRepository>,
        taxes: Arc<dyn TaxRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            locations,
            taxes,
            clock,
        }
    }

    pub async fn locations(&self) -> Result<Vec<Location>, Error> {
        Ok(self.locations.list().await?)
    }

    pub async fn location(&self, id: Uuid) -> Result<Location, Error> {
        found(self.locations.find_by_id(id).await?, "location")
    }

    pub async fn create_location(
        &self,
        principal: &Principal,
        draft: LocationDraft,
    ) -> Result<Location, Error> {
        principal.require(Permission::AdminSettings)?;
        let now = self.clock.utc();
        let location = Location {
            id: Uuid::new_v4(),
            name: draft.name,
            address: draft.address,
            email: draft.email,
            phone: draft.phone,
            website: draft.website,
            time_zone: draft.time_zone,
            created_at: now,
            updated_at: now,
        };
        self.locations.insert(&location).await?;
        info!(location_id = %location.id, "location created");
        Ok(location)
    }

    pub async fn update_location(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: LocationDraft,
    ) -> Result<Location, Error> {
        principal.require(Permission::AdminSettings)?;
        let mut location = self.location(id).await?;
        location.name = draft.name;
        location.address = draft.address;
        location.email = draft.email;
        location.phone = draft.phone;
        location.website = draft.website;
        location.time_zone = draft.time_zone;
        location.updated_at = self.clock.utc();
        self.locations.update(&location).await?;
        Ok(location)
    }

    pub async fn delete_location(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::AdminSettings)?;
        if !self.locations.delete(id).await? {
            return Err(Error::not_found("location not found"));
        }
        info!(location_id = %id, "location deleted");
        Ok(())
    }

    pub async fn taxes(&self) -> Result<Vec<Tax>, Error> {
        Ok(self.taxes.list().await?)
    }

    /// Add a tax rate. The first rate recorded becomes the default.
    pub async fn create_tax(&self, principal: &Principal, draft: TaxDraft) -> Result<Tax, Error> {
        principal.require(Permission::AdminSettings)?;
        let is_default = self.taxes.list().await?.is_empty();
        let tax = Tax {
            id: Uuid::new_v4(),
            label: draft.label,
            value: draft.value,
            is_default,
            created_at: self.clock.utc(),
        };
        self.taxes.insert(&tax).await?;
        info!(tax_id = %tax.id, value = %tax.value, is_default, "tax rate created");
        Ok(tax)
    }

    pub async fn delete_tax(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::AdminSettings)?;
        if !self.taxes.delete(id).await? {
            return Err(Error::not_found("tax rate not found"));
        }
        Ok(())
    }

    pub async fn set_default_tax(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::AdminSettings)?;
        if !self.taxes.set_default(id).await? {
            return Err(Error::not_found("tax rate not found"));
        }
        info!(tax_id = %id, "default tax rate changed");
        Ok(())
    }
}
