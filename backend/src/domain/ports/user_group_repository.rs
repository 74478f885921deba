//! Port for user group persistence.
use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::user_group::{GroupStats, UserGroup};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user group repository adapters.
    pub enum UserGroupPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "group repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "group repository query failed: {message}",
        /// Group names are unique.
        DuplicateName { name: String } => "group name already exists: {name}",
    }
}

impl From<UserGroupPersistenceError> for Error {
    fn from(error: UserGroupPersistenceError) -> Self {
        match error {
            UserGroupPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("group repository unavailable: {message}"))
            }
            UserGroupPersistenceError::Query { message } => {
                Self::internal(format!("group repository error: {message}"))
            }
            UserGroupPersistenceError::DuplicateName { name } => {
                Self::invalid_request(format!("a group named {name} already exists"))
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserGroupRepository: Send + Sync {
    /// Fetch a group by identifier, including soft-deleted rows.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserGroup>, UserGroupPersistenceError>;

    /// All live groups ordered by name.
    async fn list(&self) -> Result<Vec<UserGroup>, UserGroupPersistenceError>;

    async fn insert(&self, group: &UserGroup) -> Result<(), UserGroupPersistenceError>;

    async fn update(&self, group: &UserGroup) -> Result<(), UserGroupPersistenceError>;

    /// Live user, customer and proposal counts keyed by group. Groups with
    /// no members may be absent from the map.
    async fn stats(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, GroupStats>, UserGroupPersistenceError>;
}
