//! Port for shared resource links.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::resources::ResourceLink;

use super::define_port_error;

define_port_error! {
    /// Errors raised by resource repository adapters.
    pub enum ResourcePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "resource repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "resource repository query failed: {message}",
    }
}

impl From<ResourcePersistenceError> for Error {
    fn from(error: ResourcePersistenceError) -> Self {
        match error {
            ResourcePersistenceError::Connection { message } => {
                Self::service_unavailable(format!("resource repository unavailable: {message}"))
            }
            ResourcePersistenceError::Query { message } => {
                Self::internal(format!("resource repository error: {message}"))
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// All links, newest first.
    async fn list(&self) -> Result<Vec<ResourceLink>, ResourcePersistenceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ResourceLink>, ResourcePersistenceError>;

    async fn insert(&self, link: &ResourceLink) -> Result<(), ResourcePersistenceError>;

    async fn update(&self, link: &ResourceLink) -> Result<(), ResourcePersistenceError>;

    /// Remove a link. Returns `false` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, ResourcePersistenceError>;
}
