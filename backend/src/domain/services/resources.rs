//! Shared resource links.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::ResourceRepository;
use crate::domain::resources::{ResourceLink, ResourceLinkDraft};
use crate::domain::{Error, Permission, Principal};

use super::found;

#[derive(Clone)]
pub struct ResourceService {
    links: Arc<dyn ResourceRepository>,
    clock: Arc<dyn Clock>,
}

impl ResourceService {
    pub fn new(links: Arc<dyn ResourceRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { links, clock }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<ResourceLink>, Error> {
        principal.require(Permission::ResourcesRead)?;
        Ok(self.links.list().await?)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        draft: ResourceLinkDraft,
    ) -> Result<ResourceLink, Error> {
        principal.require(Permission::ResourcesCreate)?;
        let now = self.clock.utc();
        let link = ResourceLink {
            id: Uuid::new_v4(),
            title: draft.title,
            url: draft.url,
            kind: draft.kind,
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        self.links.insert(&link).await?;
        info!(link_id = %link.id, "resource link created");
        Ok(link)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: ResourceLinkDraft,
    ) -> Result<ResourceLink, Error> {
        principal.require(Permission::ResourcesUpdate)?;
        let mut link = found(self.links.find_by_id(id).await?, "resource link")?;
        link.title = draft.title;
        link.url = draft.url;
        link.kind = draft.kind;
        link.description = draft.description;
        link.updated_at = self.clock.utc();
        self.links.update(&link).await?;
        Ok(link)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::ResourcesDelete)?;
        if !self.links.delete(id).await? {
            return Err(Error::not_found("resource link not found"));
        }
        Ok(())
    }
}
