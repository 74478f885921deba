//! PostgreSQL-backed manufacturer and catalog repositories.
//!
//! Price list imports run in one transaction: existing `(code, style)` keys
//! are read first so the summary can split created from updated rows, then
//! the rows are upserted in batches on the unique key.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::{PageRequest, Paginated};
use uuid::Uuid;

use crate::domain::catalog::{
    AssemblyCost, CatalogFilter, CatalogItem, CatalogItemDraft, ImportSummary,
};
use crate::domain::manufacturer::Manufacturer;
use crate::domain::ports::{
    AssemblyCostTarget, CatalogPersistenceError, CatalogRepository, ManufacturerPersistenceError,
    ManufacturerRepository,
};

use super::diesel_error_mapping::{
    contains_pattern, count_u64, map_basic_diesel_error, map_basic_pool_error, offset_i64,
    unique_violation,
};
use super::models::{AssemblyCostRow, CatalogItemRow, ManufacturerRow};
use super::pool::{DbPool, PoolError};
use super::schema::{catalog_assembly_costs, catalog_items, manufacturers};
use super::sql_functions::lower;

/// Rows per `INSERT` during imports, well under the bind parameter limit.
const IMPORT_BATCH: usize = 1_000;

/// Diesel-backed manufacturer storage.
#[derive(Clone)]
pub struct DieselManufacturerRepository {
    pool: DbPool,
}

impl DieselManufacturerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_manufacturer_pool_error(error: PoolError) -> ManufacturerPersistenceError {
    map_basic_pool_error(error, ManufacturerPersistenceError::connection)
}

fn map_manufacturer_diesel_error(error: diesel::result::Error) -> ManufacturerPersistenceError {
    map_basic_diesel_error(
        error,
        ManufacturerPersistenceError::query,
        ManufacturerPersistenceError::connection,
    )
}

#[async_trait]
impl ManufacturerRepository for DieselManufacturerRepository {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Paginated<Manufacturer>, ManufacturerPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(map_manufacturer_pool_error)?;
        let total: i64 = manufacturers::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_manufacturer_diesel_error)?;
        let rows: Vec<ManufacturerRow> = manufacturers::table
            .select(ManufacturerRow::as_select())
            .order_by((manufacturers::name, manufacturers::id))
            .limit(i64::from(page.limit()))
            .offset(offset_i64(page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_manufacturer_diesel_error)?;
        let items = rows.into_iter().map(Manufacturer::from).collect();
        Ok(Paginated::new(items, page, count_u64(total)))
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Manufacturer>, ManufacturerPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(map_manufacturer_pool_error)?;
        let row: Option<ManufacturerRow> = manufacturers::table
            .find(id)
            .select(ManufacturerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_manufacturer_diesel_error)?;
        Ok(row.map(Manufacturer::from))
    }

    async fn insert(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(map_manufacturer_pool_error)?;
        diesel::insert_into(manufacturers::table)
            .values(ManufacturerRow::from(manufacturer))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_manufacturer_diesel_error)
    }

    async fn update(&self, manufacturer: &Manufacturer) -> Result<(), ManufacturerPersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(map_manufacturer_pool_error)?;
        let updated = diesel::update(manufacturers::table.find(manufacturer.id))
            .set(ManufacturerRow::from(manufacturer))
            .execute(&mut conn)
            .await
            .map_err(map_manufacturer_diesel_error)?;
        if updated == 0 {
            return Err(ManufacturerPersistenceError::query(
                "manufacturer not found for update",
            ));
        }
        Ok(())
    }
}

/// Diesel-backed catalog item storage.
#[derive(Clone)]
pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CatalogPersistenceError {
    map_basic_pool_error(error, CatalogPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CatalogPersistenceError {
    map_basic_diesel_error(
        error,
        CatalogPersistenceError::query,
        CatalogPersistenceError::connection,
    )
}

fn map_item_write_error(error: diesel::result::Error, item: &CatalogItem) -> CatalogPersistenceError {
    if unique_violation(&error).is_some() {
        return CatalogPersistenceError::duplicate_item(item.code.as_str(), item.style.as_str());
    }
    map_diesel_error(error)
}

fn filtered(
    manufacturer_id: Uuid,
    filter: &CatalogFilter,
) -> catalog_items::BoxedQuery<'static, Pg> {
    let mut query = catalog_items::table
        .filter(catalog_items::manufacturer_id.eq(manufacturer_id))
        .into_boxed();
    if let Some(style) = filter.style.as_deref() {
        query = query.filter(lower(catalog_items::style).eq(style.to_lowercase()));
    }
    if let Some(needle) = filter.search.as_deref() {
        let pattern = contains_pattern(needle);
        query = query.filter(
            catalog_items::code
                .ilike(pattern.clone())
                .or(catalog_items::description.ilike(pattern)),
        );
    }
    query
}

fn import_row(manufacturer_id: Uuid, draft: &CatalogItemDraft, now: DateTime<Utc>) -> CatalogItemRow {
    CatalogItemRow {
        id: Uuid::new_v4(),
        manufacturer_id,
        code: draft.code.clone(),
        description: draft.description.clone(),
        style: draft.style.clone(),
        item_type: draft.item_type.clone(),
        price: draft.price,
        created_at: now,
        updated_at: now,
    }
}

/// Split drafts into created and updated counts against the stored keys.
fn summarise(existing: &HashSet<(String, String)>, rows: &[CatalogItemDraft]) -> ImportSummary {
    let mut seen = existing.clone();
    let mut summary = ImportSummary::default();
    for row in rows {
        if seen.insert((row.code.clone(), row.style.clone())) {
            summary.created += 1;
        } else {
            summary.updated += 1;
        }
    }
    summary
}

#[async_trait]
impl CatalogRepository for DieselCatalogRepository {
    async fn list(
        &self,
        manufacturer_id: Uuid,
        filter: &CatalogFilter,
        page: PageRequest,
    ) -> Result<Paginated<CatalogItem>, CatalogPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(manufacturer_id, filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<CatalogItemRow> = filtered(manufacturer_id, filter)
            .select(CatalogItemRow::as_select())
            .order_by((catalog_items::style, catalog_items::code))
            .limit(i64::from(page.limit()))
            .offset(offset_i64(page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let items = rows.into_iter().map(CatalogItem::from).collect();
        Ok(Paginated::new(items, page, count_u64(total)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CatalogItem>, CatalogPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CatalogItemRow> = catalog_items::table
            .find(id)
            .select(CatalogItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(CatalogItem::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CatalogItem>, CatalogPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CatalogItemRow> = catalog_items::table
            .filter(catalog_items::id.eq_any(ids))
            .select(CatalogItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn insert(&self, item: &CatalogItem) -> Result<(), CatalogPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(catalog_items::table)
            .values(CatalogItemRow::from(item))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_item_write_error(err, item))
    }

    async fn update(&self, item: &CatalogItem) -> Result<(), CatalogPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(catalog_items::table.find(item.id))
            .set(CatalogItemRow::from(item))
            .execute(&mut conn)
            .await
            .map_err(|err| map_item_write_error(err, item))?;
        if updated == 0 {
            return Err(CatalogPersistenceError::query("catalog item not found for update"));
        }
        Ok(())
    }

    async fn import(
        &self,
        manufacturer_id: Uuid,
        rows: &[CatalogItemDraft],
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, CatalogPersistenceError> {
        if rows.is_empty() {
            return Ok(ImportSummary::default());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_rows: Vec<CatalogItemRow> = rows
            .iter()
            .map(|draft| import_row(manufacturer_id, draft, now))
            .collect();

        conn.transaction(|conn| {
            async move {
                let keys: Vec<(String, String)> = catalog_items::table
                    .filter(catalog_items::manufacturer_id.eq(manufacturer_id))
                    .select((catalog_items::code, catalog_items::style))
                    .for_update()
                    .load(conn)
                    .await?;
                let summary = summarise(&keys.into_iter().collect(), rows);
                for batch in new_rows.chunks(IMPORT_BATCH) {
                    diesel::insert_into(catalog_items::table)
                        .values(batch)
                        .on_conflict((
                            catalog_items::manufacturer_id,
                            catalog_items::code,
                            catalog_items::style,
                        ))
                        .do_update()
                        .set((
                            catalog_items::description
                                .eq(excluded(catalog_items::description)),
                            catalog_items::item_type.eq(excluded(catalog_items::item_type)),
                            catalog_items::price.eq(excluded(catalog_items::price)),
                            catalog_items::updated_at.eq(excluded(catalog_items::updated_at)),
                        ))
                        .execute(conn)
                        .await?;
                }
                Ok(summary)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn styles(&self, manufacturer_id: Uuid) -> Result<Vec<String>, CatalogPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        catalog_items::table
            .filter(catalog_items::manufacturer_id.eq(manufacturer_id))
            .filter(catalog_items::style.ne(""))
            .select(catalog_items::style)
            .distinct()
            .order_by(catalog_items::style)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn assembly_costs(
        &self,
        item_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, AssemblyCost)>, CatalogPersistenceError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AssemblyCostRow> = catalog_assembly_costs::table
            .filter(catalog_assembly_costs::catalog_item_id.eq_any(item_ids))
            .select(AssemblyCostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(AssemblyCostRow::into_entry).collect())
    }

    async fn set_assembly_cost(
        &self,
        target: AssemblyCostTarget,
        cost: AssemblyCost,
    ) -> Result<u64, CatalogPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let ids: Vec<Uuid> = match target {
                    AssemblyCostTarget::Item(id) => {
                        catalog_items::table
                            .find(id)
                            .select(catalog_items::id)
                            .load(conn)
                            .await?
                    }
                    AssemblyCostTarget::Manufacturer(manufacturer_id) => {
                        catalog_items::table
                            .filter(catalog_items::manufacturer_id.eq(manufacturer_id))
                            .select(catalog_items::id)
                            .load(conn)
                            .await?
                    }
                };
                let rows: Vec<AssemblyCostRow> = ids
                    .iter()
                    .map(|id| AssemblyCostRow::new(*id, cost))
                    .collect();
                for batch in rows.chunks(IMPORT_BATCH) {
                    diesel::insert_into(catalog_assembly_costs::table)
                        .values(batch)
                        .on_conflict(catalog_assembly_costs::catalog_item_id)
                        .do_update()
                        .set((
                            catalog_assembly_costs::kind
                                .eq(excluded(catalog_assembly_costs::kind)),
                            catalog_assembly_costs::amount
                                .eq(excluded(catalog_assembly_costs::amount)),
                        ))
                        .execute(conn)
                        .await?;
                }
                Ok(ids.len() as u64)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
