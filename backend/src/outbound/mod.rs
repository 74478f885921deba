//! Outbound adapters implementing the domain ports.
//!
//! - **memory**: mutex-guarded tables for local runs and tests
//! - **persistence**: PostgreSQL-backed repositories using Diesel
//!
//! Adapters translate between domain types and storage rows. They hold no
//! business rules beyond the uniqueness constraints the schema enforces.

pub mod memory;
pub mod persistence;
