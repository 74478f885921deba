//! Users and user groups.

use std::collections::HashMap;

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::ports::{
    UserGroupPersistenceError, UserGroupRepository, UserPersistenceError, UserRepository,
};
use crate::domain::user_group::{GroupStats, UserGroup};
use crate::domain::{EmailAddress, User, UserId};

use super::{MemoryStore, paginate};

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables.users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Paginated<User>, UserPersistenceError> {
        let tables = self.lock().map_err(UserPersistenceError::query)?;
        let mut rows: Vec<User> = tables
            .users
            .values()
            .filter(|u| !u.is_deleted)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(rows, page))
    }

    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut tables = self.lock().map_err(UserPersistenceError::query)?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(UserPersistenceError::duplicate_email(user.email.as_str()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut tables = self.lock().map_err(UserPersistenceError::query)?;
        if tables
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(UserPersistenceError::duplicate_email(user.email.as_str()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl UserGroupRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserGroup>, UserGroupPersistenceError> {
        let tables = self.lock().map_err(UserGroupPersistenceError::query)?;
        Ok(tables.groups.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserGroup>, UserGroupPersistenceError> {
        let tables = self.lock().map_err(UserGroupPersistenceError::query)?;
        let mut rows: Vec<UserGroup> = tables
            .groups
            .values()
            .filter(|g| !g.is_deleted)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert(&self, group: &UserGroup) -> Result<(), UserGroupPersistenceError> {
        let mut tables = self.lock().map_err(UserGroupPersistenceError::query)?;
        if tables.groups.values().any(|g| g.name == group.name) {
            return Err(UserGroupPersistenceError::duplicate_name(group.name.as_str()));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn update(&self, group: &UserGroup) -> Result<(), UserGroupPersistenceError> {
        let mut tables = self.lock().map_err(UserGroupPersistenceError::query)?;
        if tables
            .groups
            .values()
            .any(|g| g.name == group.name && g.id != group.id)
        {
            return Err(UserGroupPersistenceError::duplicate_name(group.name.as_str()));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn stats(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, GroupStats>, UserGroupPersistenceError> {
        let tables = self.lock().map_err(UserGroupPersistenceError::query)?;
        let mut stats: HashMap<Uuid, GroupStats> =
            ids.iter().map(|id| (*id, GroupStats::default())).collect();
        let live_users = tables.users.values().filter(|u| !u.is_deleted);
        for group in live_users.filter_map(|u| u.group_id) {
            if let Some(entry) = stats.get_mut(&group) {
                entry.users += 1;
            }
        }
        let live_customers = tables.customers.values().filter(|c| !c.is_deleted);
        for group in live_customers.filter_map(|c| c.group_id) {
            if let Some(entry) = stats.get_mut(&group) {
                entry.customers += 1;
            }
        }
        let live_proposals = tables.proposals.values().filter(|p| !p.is_deleted);
        for group in live_proposals.filter_map(|p| p.owner_group_id) {
            if let Some(entry) = stats.get_mut(&group) {
                entry.proposals += 1;
            }
        }
        Ok(stats)
    }
}
