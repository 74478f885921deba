//! Administration of user groups and their pricing multipliers.

use std::sync::Arc;

use mockable::Clock;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::UserGroupRepository;
use crate::domain::user_group::{
    ContractorOverview, GroupMultiplier, GroupStats, UserGroup, UserGroupDraft,
};
use crate::domain::{Error, Permission, Principal};

use super::{found, invalid};

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn UserGroupRepository>,
    clock: Arc<dyn Clock>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn UserGroupRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { groups, clock }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<UserGroup>, Error> {
        principal.require(Permission::AdminGroups)?;
        Ok(self.groups.list().await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<UserGroup, Error> {
        principal.require(Permission::AdminGroups)?;
        self.live(id).await
    }

    /// Contractor groups, newest first, with their live membership counts.
    pub async fn contractors(
        &self,
        principal: &Principal,
    ) -> Result<Vec<ContractorOverview>, Error> {
        principal.require(Permission::AdminGroups)?;
        let mut groups: Vec<UserGroup> = self
            .groups
            .list()
            .await?
            .into_iter()
            .filter(UserGroup::is_contractor)
            .collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
        let stats = self.groups.stats(&ids).await?;
        Ok(groups
            .into_iter()
            .map(|group| ContractorOverview {
                stats: stats.get(&group.id).copied().unwrap_or_default(),
                group,
            })
            .collect())
    }

    /// One contractor group with its counts; standard groups are not found.
    pub async fn contractor(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> Result<ContractorOverview, Error> {
        principal.require(Permission::AdminGroups)?;
        let group = found(
            Some(self.live(id).await?).filter(UserGroup::is_contractor),
            "contractor",
        )?;
        let stats: GroupStats = self
            .groups
            .stats(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(ContractorOverview { group, stats })
    }

    /// Create a group. New groups start with the multiplier disabled.
    pub async fn create(
        &self,
        principal: &Principal,
        draft: UserGroupDraft,
    ) -> Result<UserGroup, Error> {
        principal.require(Permission::AdminGroups)?;
        let now = self.clock.utc();
        let group = UserGroup {
            id: Uuid::new_v4(),
            name: draft.name,
            group_type: draft.group_type,
            modules: draft.modules,
            multiplier: GroupMultiplier::disabled(),
            contractor_settings: draft.contractor_settings,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.groups.insert(&group).await?;
        info!(group_id = %group.id, group_type = %group.group_type, "user group created");
        Ok(group)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        draft: UserGroupDraft,
    ) -> Result<UserGroup, Error> {
        principal.require(Permission::AdminGroups)?;
        let mut group = self.live(id).await?;
        group.name = draft.name;
        group.group_type = draft.group_type;
        group.modules = draft.modules;
        group.contractor_settings = draft.contractor_settings;
        group.updated_at = self.clock.utc();
        self.groups.update(&group).await?;
        Ok(group)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), Error> {
        principal.require(Permission::AdminGroups)?;
        let mut group = self.live(id).await?;
        group.is_deleted = true;
        group.updated_at = self.clock.utc();
        self.groups.update(&group).await?;
        info!(group_id = %id, "user group deleted");
        Ok(())
    }

    /// Set the group multiplier applied to quotes for its members.
    pub async fn set_multiplier(
        &self,
        principal: &Principal,
        id: Uuid,
        value: Decimal,
        enabled: bool,
    ) -> Result<UserGroup, Error> {
        principal.require(Permission::AdminGroups)?;
        let multiplier = GroupMultiplier::try_new(value, enabled).map_err(invalid)?;
        let mut group = self.live(id).await?;
        group.multiplier = multiplier;
        group.updated_at = self.clock.utc();
        self.groups.update(&group).await?;
        info!(group_id = %id, %value, enabled, "group multiplier updated");
        Ok(group)
    }

    async fn live(&self, id: Uuid) -> Result<UserGroup, Error> {
        found(
            self.groups.find_by_id(id).await?.filter(|g| !g.is_deleted),
            "user group",
        )
    }
}
