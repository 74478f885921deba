//! Domain ports for the hexagonal boundary.
//!
//! Every repository trait has an in-process adapter under
//! `outbound::memory` and a Diesel adapter under `outbound::persistence`.

mod macros;
pub(crate) use macros::define_port_error;

mod catalog_repository;
mod customer_repository;
mod manufacturer_repository;
mod modification_repository;
mod order_repository;
mod payment_repository;
mod proposal_repository;
mod resource_repository;
mod settings_repository;
mod user_group_repository;
mod user_repository;

#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
pub use catalog_repository::{AssemblyCostTarget, CatalogPersistenceError, CatalogRepository};
#[cfg(test)]
pub use customer_repository::MockCustomerRepository;
pub use customer_repository::{CustomerPersistenceError, CustomerRepository};
#[cfg(test)]
pub use manufacturer_repository::MockManufacturerRepository;
pub use manufacturer_repository::{ManufacturerPersistenceError, ManufacturerRepository};
#[cfg(test)]
pub use modification_repository::MockModificationRepository;
pub use modification_repository::{ModificationPersistenceError, ModificationRepository};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{BackfillQuery, OrderPersistenceError, OrderRepository};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::{PaymentPersistenceError, PaymentRepository};
#[cfg(test)]
pub use proposal_repository::MockProposalRepository;
pub use proposal_repository::{ProposalPersistenceError, ProposalRepository};
#[cfg(test)]
pub use resource_repository::MockResourceRepository;
pub use resource_repository::{ResourcePersistenceError, ResourceRepository};
#[cfg(test)]
pub use settings_repository::{MockLocationRepository, MockTaxRepository};
pub use settings_repository::{LocationRepository, SettingsPersistenceError, TaxRepository};
#[cfg(test)]
pub use user_group_repository::MockUserGroupRepository;
pub use user_group_repository::{UserGroupPersistenceError, UserGroupRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
