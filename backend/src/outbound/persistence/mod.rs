//! PostgreSQL persistence adapters using Diesel.
//!
//! Each repository port has a Diesel implementation sharing one `bb8` pool
//! through `diesel-async`. Row structs (`models.rs`) and table definitions
//! (`schema.rs`) stay private; adapters translate rows into domain types and
//! map database failures into the port error of their repository.
//!
//! # Example
//!
//! ```no_run
//! use cabinet_backend::outbound::persistence::{
//!     DbPool, DieselCustomerRepository, PoolConfig, run_pending_migrations,
//! };
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "postgres://localhost/cabinet";
//! run_pending_migrations(url)?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let customers = DieselCustomerRepository::new(pool);
//! # let _ = customers;
//! # Ok(())
//! # }
//! ```

mod diesel_catalog_repository;
mod diesel_customer_repository;
mod diesel_error_mapping;
mod diesel_modification_repository;
mod diesel_order_repository;
mod diesel_payment_repository;
mod diesel_proposal_repository;
mod diesel_settings_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;
mod sql_functions;

pub use diesel_catalog_repository::{DieselCatalogRepository, DieselManufacturerRepository};
pub use diesel_customer_repository::DieselCustomerRepository;
pub use diesel_modification_repository::DieselModificationRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_proposal_repository::DieselProposalRepository;
pub use diesel_settings_repository::{
    DieselLocationRepository, DieselResourceRepository, DieselTaxRepository,
};
pub use diesel_user_repository::{DieselUserGroupRepository, DieselUserRepository};
pub use migrations::run_pending_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
