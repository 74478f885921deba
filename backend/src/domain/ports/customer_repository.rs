//! Port for customer persistence.
use async_trait::async_trait;
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::customer::{Customer, CustomerFilter};
use crate::domain::{EmailAddress, Error};

use super::define_port_error;

define_port_error! {
    /// Errors raised by customer repository adapters.
    pub enum CustomerPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "customer repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "customer repository query failed: {message}",
    }
}

impl From<CustomerPersistenceError> for Error {
    fn from(error: CustomerPersistenceError) -> Self {
        match error {
            CustomerPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("customer repository unavailable: {message}"))
            }
            CustomerPersistenceError::Query { message } => {
                Self::internal(format!("customer repository error: {message}"))
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Page through live customers matching the filter, newest first.
    async fn list(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Paginated<Customer>, CustomerPersistenceError>;

    /// Fetch a customer by identifier, including soft-deleted rows.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomerPersistenceError>;

    /// Live customer with this email inside the given group (or ungrouped
    /// when `group_id` is `None`).
    async fn find_by_email(
        &self,
        email: &EmailAddress,
        group_id: Option<Uuid>,
    ) -> Result<Option<Customer>, CustomerPersistenceError>;

    /// Display names for the given ids; unknown ids are skipped.
    async fn names(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, CustomerPersistenceError>;

    async fn insert(&self, customer: &Customer) -> Result<(), CustomerPersistenceError>;

    async fn update(&self, customer: &Customer) -> Result<(), CustomerPersistenceError>;
}
