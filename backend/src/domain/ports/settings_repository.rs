//! Ports for company settings: locations and tax rates.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::settings::{Location, Tax};

use super::define_port_error;

define_port_error! {
    /// Errors raised by settings repository adapters.
    pub enum SettingsPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "settings repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "settings repository query failed: {message}",
    }
}

impl From<SettingsPersistenceError> for Error {
    fn from(error: SettingsPersistenceError) -> Self {
        match error {
            SettingsPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("settings repository unavailable: {message}"))
            }
            SettingsPersistenceError::Query { message } => {
                Self::internal(format!("settings repository error: {message}"))
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Location>, SettingsPersistenceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, SettingsPersistenceError>;

    async fn insert(&self, location: &Location) -> Result<(), SettingsPersistenceError>;

    async fn update(&self, location: &Location) -> Result<(), SettingsPersistenceError>;

    /// Remove a location. Returns `false` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, SettingsPersistenceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaxRepository: Send + Sync {
    /// All tax rates, default first.
    async fn list(&self) -> Result<Vec<Tax>, SettingsPersistenceError>;

    async fn insert(&self, tax: &Tax) -> Result<(), SettingsPersistenceError>;

    /// Remove a tax rate. Returns `false` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, SettingsPersistenceError>;

    /// Make one rate the default and clear the flag on every other rate in
    /// the same transaction. Returns `false` when the rate does not exist.
    async fn set_default(&self, id: Uuid) -> Result<bool, SettingsPersistenceError>;
}
