//! PostgreSQL-backed company settings: locations, tax rates and resource
//! links.
//!
//! `taxes_single_default_idx` allows at most one default rate. Default
//! changes clear the previous default before setting the new one, inside a
//! transaction, because the partial unique index is checked per row.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    LocationRepository, ResourcePersistenceError, ResourceRepository, SettingsPersistenceError,
    TaxRepository,
};
use crate::domain::resources::ResourceLink;
use crate::domain::settings::{Location, Tax};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{LocationRow, ResourceLinkRow, TaxRow};
use super::pool::{DbPool, PoolError};
use super::schema::{locations, resource_links, taxes};

fn map_pool_error(error: PoolError) -> SettingsPersistenceError {
    map_basic_pool_error(error, SettingsPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SettingsPersistenceError {
    map_basic_diesel_error(
        error,
        SettingsPersistenceError::query,
        SettingsPersistenceError::connection,
    )
}

/// Diesel-backed showroom locations.
#[derive(Clone)]
pub struct DieselLocationRepository {
    pool: DbPool,
}

impl DieselLocationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepository for DieselLocationRepository {
    async fn list(&self) -> Result<Vec<Location>, SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LocationRow> = locations::table
            .select(LocationRow::as_select())
            .order_by((locations::name, locations::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LocationRow> = locations::table
            .find(id)
            .select(LocationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Location::from))
    }

    async fn insert(&self, location: &Location) -> Result<(), SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(locations::table)
            .values(LocationRow::from(location))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, location: &Location) -> Result<(), SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(locations::table.find(location.id))
            .set(LocationRow::from(location))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(SettingsPersistenceError::query(
                "location not found for update",
            ));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(locations::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

/// Diesel-backed tax rates.
#[derive(Clone)]
pub struct DieselTaxRepository {
    pool: DbPool,
}

impl DieselTaxRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn clear_defaults_except(
    conn: &mut AsyncPgConnection,
    keep: Uuid,
) -> Result<usize, diesel::result::Error> {
    diesel::update(
        taxes::table
            .filter(taxes::is_default.eq(true))
            .filter(taxes::id.ne(keep)),
    )
    .set(taxes::is_default.eq(false))
    .execute(conn)
    .await
}

#[async_trait]
impl TaxRepository for DieselTaxRepository {
    async fn list(&self) -> Result<Vec<Tax>, SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TaxRow> = taxes::table
            .select(TaxRow::as_select())
            .order_by((taxes::is_default.desc(), taxes::created_at, taxes::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Tax::from).collect())
    }

    async fn insert(&self, tax: &Tax) -> Result<(), SettingsPersistenceError> {
        let row = TaxRow::from(tax);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                if row.is_default {
                    clear_defaults_except(conn, row.id).await?;
                }
                diesel::insert_into(taxes::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(taxes::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn set_default(&self, id: Uuid) -> Result<bool, SettingsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let exists: Option<Uuid> = taxes::table
                    .find(id)
                    .select(taxes::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if exists.is_none() {
                    return Ok(false);
                }
                clear_defaults_except(conn, id).await?;
                diesel::update(taxes::table.find(id))
                    .set(taxes::is_default.eq(true))
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

/// Diesel-backed resource links.
#[derive(Clone)]
pub struct DieselResourceRepository {
    pool: DbPool,
}

impl DieselResourceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_resource_pool_error(error: PoolError) -> ResourcePersistenceError {
    map_basic_pool_error(error, ResourcePersistenceError::connection)
}

fn map_resource_diesel_error(error: diesel::result::Error) -> ResourcePersistenceError {
    map_basic_diesel_error(
        error,
        ResourcePersistenceError::query,
        ResourcePersistenceError::connection,
    )
}

#[async_trait]
impl ResourceRepository for DieselResourceRepository {
    async fn list(&self) -> Result<Vec<ResourceLink>, ResourcePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_resource_pool_error)?;
        let rows: Vec<ResourceLinkRow> = resource_links::table
            .select(ResourceLinkRow::as_select())
            .order_by((resource_links::created_at.desc(), resource_links::id))
            .load(&mut conn)
            .await
            .map_err(map_resource_diesel_error)?;
        Ok(rows.into_iter().map(ResourceLink::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ResourceLink>, ResourcePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_resource_pool_error)?;
        let row: Option<ResourceLinkRow> = resource_links::table
            .find(id)
            .select(ResourceLinkRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_resource_diesel_error)?;
        Ok(row.map(ResourceLink::from))
    }

    async fn insert(&self, link: &ResourceLink) -> Result<(), ResourcePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_resource_pool_error)?;
        diesel::insert_into(resource_links::table)
            .values(ResourceLinkRow::from(link))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_resource_diesel_error)
    }

    async fn update(&self, link: &ResourceLink) -> Result<(), ResourcePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_resource_pool_error)?;
        let updated = diesel::update(resource_links::table.find(link.id))
            .set(ResourceLinkRow::from(link))
            .execute(&mut conn)
            .await
            .map_err(map_resource_diesel_error)?;
        if updated == 0 {
            return Err(ResourcePersistenceError::query(
                "resource link not found for update",
            ));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ResourcePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_resource_pool_error)?;
        let deleted = diesel::delete(resource_links::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_resource_diesel_error)?;
        Ok(deleted > 0)
    }
}
