//! Port for manufacturer persistence.
use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::manufacturer::Manufacturer;

use super::define_port_error;

define_port_error! {
    /// Errors raised by manufacturer repository adapters.
    pub enum ManufacturerPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "manufacturer repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "manufacturer repository query failed: {message}",
    }
}

impl From<ManufacturerPersistenceError> for Error {
    fn from(error: ManufacturerPersistenceError) -> Self {
        match error {
            ManufacturerPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("manufacturer repository unavailable: {message}"))
            }
            ManufacturerPersistenceError::Query { message } => {
                Self::internal(format!("manufacturer repository error: {message}"))
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManufacturerRepository: Send + Sync {
    /// Page through manufacturers ordered by name.
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Paginated<Manufacturer>, ManufacturerPersistenceError>;

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Manufacturer>, ManufacturerPersistenceError>;

    async fn insert(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerPersistenceError>;

    async fn update(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerPersistenceError>;
}
