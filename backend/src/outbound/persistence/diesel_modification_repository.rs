//! PostgreSQL-backed `ModificationRepository`.
//!
//! Assignments reference templates with `ON DELETE CASCADE`, so removing a
//! template (directly or through its category) drops its assignments in the
//! same statement. Category deletes lock the category row first so a
//! concurrent insert cannot slip a template in between the emptiness check
//! and the delete.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use uuid::Uuid;

use crate::domain::modification::{
    CategoryDeleteMode, ModificationAssignment, ModificationCategory, ModificationTemplate, Owner,
};
use crate::domain::ports::{ModificationPersistenceError, ModificationRepository};

use super::diesel_error_mapping::{convert_rows, map_basic_diesel_error, map_basic_pool_error};
use super::models::{ModificationAssignmentRow, ModificationCategoryRow, ModificationTemplateRow};
use super::pool::{DbPool, PoolError};
use super::schema::{modification_assignments, modification_categories, modification_templates};

/// Diesel-backed modification catalog.
#[derive(Clone)]
pub struct DieselModificationRepository {
    pool: DbPool,
}

impl DieselModificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ModificationPersistenceError {
    map_basic_pool_error(error, ModificationPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ModificationPersistenceError {
    map_basic_diesel_error(
        error,
        ModificationPersistenceError::query,
        ModificationPersistenceError::connection,
    )
}

fn categories_of(owner: Owner) -> modification_categories::BoxedQuery<'static, Pg> {
    let query = modification_categories::table.into_boxed();
    match owner.manufacturer_id() {
        Some(id) => query.filter(modification_categories::manufacturer_id.eq(id)),
        None => query.filter(modification_categories::manufacturer_id.is_null()),
    }
}

fn templates_of(owner: Owner) -> modification_templates::BoxedQuery<'static, Pg> {
    let query = modification_templates::table.into_boxed();
    match owner.manufacturer_id() {
        Some(id) => query.filter(modification_templates::manufacturer_id.eq(id)),
        None => query.filter(modification_templates::manufacturer_id.is_null()),
    }
}

/// Outcome of the category delete transaction.
enum Removal {
    Missing,
    NotEmpty,
    Deleted,
}

#[async_trait]
impl ModificationRepository for DieselModificationRepository {
    async fn list_categories(
        &self,
        owner: Owner,
    ) -> Result<Vec<ModificationCategory>, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ModificationCategoryRow> = categories_of(owner)
            .select(ModificationCategoryRow::as_select())
            .order_by((
                modification_categories::order_index,
                modification_categories::name,
                modification_categories::id,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(ModificationCategory::from).collect())
    }

    async fn find_category(
        &self,
        id: Uuid,
    ) -> Result<Option<ModificationCategory>, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ModificationCategoryRow> = modification_categories::table
            .find(id)
            .select(ModificationCategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(ModificationCategory::from))
    }

    async fn insert_category(
        &self,
        category: &ModificationCategory,
    ) -> Result<(), ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(modification_categories::table)
            .values(ModificationCategoryRow::from(category))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_category(
        &self,
        category: &ModificationCategory,
    ) -> Result<(), ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(modification_categories::table.find(category.id))
            .set(ModificationCategoryRow::from(category))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(ModificationPersistenceError::query(
                "modification category not found for update",
            ));
        }
        Ok(())
    }

    async fn delete_category(
        &self,
        id: Uuid,
        mode: CategoryDeleteMode,
    ) -> Result<bool, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removal = conn
            .transaction(|conn| {
                async move {
                    let locked: Option<Uuid> = modification_categories::table
                        .find(id)
                        .select(modification_categories::id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    if locked.is_none() {
                        return Ok(Removal::Missing);
                    }
                    let held = modification_templates::table
                        .filter(modification_templates::category_id.eq(id));
                    match mode {
                        CategoryDeleteMode::Only => {
                            let count: i64 = held.count().get_result(conn).await?;
                            if count > 0 {
                                return Ok(Removal::NotEmpty);
                            }
                        }
                        CategoryDeleteMode::WithTemplates => {
                            diesel::delete(held).execute(conn).await?;
                        }
                        CategoryDeleteMode::MoveTo(target) => {
                            diesel::update(held)
                                .set(modification_templates::category_id.eq(target))
                                .execute(conn)
                                .await?;
                        }
                    }
                    diesel::delete(modification_categories::table.find(id))
                        .execute(conn)
                        .await?;
                    Ok(Removal::Deleted)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        match removal {
            Removal::Missing => Ok(false),
            Removal::NotEmpty => Err(ModificationPersistenceError::category_not_empty(id)),
            Removal::Deleted => Ok(true),
        }
    }

    async fn list_templates(
        &self,
        owner: Owner,
    ) -> Result<Vec<ModificationTemplate>, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ModificationTemplateRow> = templates_of(owner)
            .select(ModificationTemplateRow::as_select())
            .order_by((modification_templates::name, modification_templates::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(ModificationTemplate::from).collect())
    }

    async fn find_template(
        &self,
        id: Uuid,
    ) -> Result<Option<ModificationTemplate>, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ModificationTemplateRow> = modification_templates::table
            .find(id)
            .select(ModificationTemplateRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(ModificationTemplate::from))
    }

    async fn find_templates(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ModificationTemplate>, ModificationPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ModificationTemplateRow> = modification_templates::table
            .filter(modification_templates::id.eq_any(ids))
            .select(ModificationTemplateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(ModificationTemplate::from).collect())
    }

    async fn insert_template(
        &self,
        template: &ModificationTemplate,
    ) -> Result<(), ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(modification_templates::table)
            .values(ModificationTemplateRow::from(template))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_template(
        &self,
        template: &ModificationTemplate,
    ) -> Result<(), ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(modification_templates::table.find(template.id))
            .set(ModificationTemplateRow::from(template))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(ModificationPersistenceError::query(
                "modification template not found for update",
            ));
        }
        Ok(())
    }

    async fn delete_template(&self, id: Uuid) -> Result<bool, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(modification_templates::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_assignments(
        &self,
        manufacturer_id: Uuid,
    ) -> Result<Vec<ModificationAssignment>, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ModificationAssignmentRow> = modification_assignments::table
            .filter(modification_assignments::manufacturer_id.eq(manufacturer_id))
            .select(ModificationAssignmentRow::as_select())
            .order_by((
                modification_assignments::updated_at.desc(),
                modification_assignments::id,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_rows(rows, ModificationPersistenceError::query)
    }

    async fn insert_assignment(
        &self,
        assignment: &ModificationAssignment,
    ) -> Result<(), ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(modification_assignments::table)
            .values(ModificationAssignmentRow::from(assignment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, ModificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(modification_assignments::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
