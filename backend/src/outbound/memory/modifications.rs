//! Modification categories, templates and assignments.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::modification::{
    CategoryDeleteMode, ModificationAssignment, ModificationCategory, ModificationTemplate, Owner,
};
use crate::domain::ports::{ModificationPersistenceError, ModificationRepository};

use super::{MemoryStore, Tables};

/// Drop the given templates and every assignment pointing at them.
fn remove_templates(tables: &mut Tables, ids: &[Uuid]) {
    tables
        .modification_templates
        .retain(|id, _| !ids.contains(id));
    tables
        .modification_assignments
        .retain(|_, a| !ids.contains(&a.template_id));
}

#[async_trait]
impl ModificationRepository for MemoryStore {
    async fn list_categories(
        &self,
        owner: Owner,
    ) -> Result<Vec<ModificationCategory>, ModificationPersistenceError> {
        let tables = self.lock().map_err(ModificationPersistenceError::query)?;
        let mut rows: Vec<ModificationCategory> = tables
            .modification_categories
            .values()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rows)
    }

    async fn find_category(
        &self,
        id: Uuid,
    ) -> Result<Option<ModificationCategory>, ModificationPersistenceError> {
        let tables = self.lock().map_err(ModificationPersistenceError::query)?;
        Ok(tables.modification_categories.get(&id).cloned())
    }

    async fn insert_category(
        &self,
        category: &ModificationCategory,
    ) -> Result<(), ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        tables
            .modification_categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(
        &self,
        category: &ModificationCategory,
    ) -> Result<(), ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        tables
            .modification_categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(
        &self,
        id: Uuid,
        mode: CategoryDeleteMode,
    ) -> Result<bool, ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        if !tables.modification_categories.contains_key(&id) {
            return Ok(false);
        }
        let held: Vec<Uuid> = tables
            .modification_templates
            .values()
            .filter(|t| t.category_id == Some(id))
            .map(|t| t.id)
            .collect();
        match mode {
            CategoryDeleteMode::Only if !held.is_empty() => {
                return Err(ModificationPersistenceError::category_not_empty(id));
            }
            CategoryDeleteMode::Only => {}
            CategoryDeleteMode::WithTemplates => remove_templates(&mut tables, &held),
            CategoryDeleteMode::MoveTo(target) => {
                for template in tables.modification_templates.values_mut() {
                    if template.category_id == Some(id) {
                        template.category_id = Some(target);
                    }
                }
            }
        }
        tables.modification_categories.remove(&id);
        Ok(true)
    }

    async fn list_templates(
        &self,
        owner: Owner,
    ) -> Result<Vec<ModificationTemplate>, ModificationPersistenceError> {
        let tables = self.lock().map_err(ModificationPersistenceError::query)?;
        let mut rows: Vec<ModificationTemplate> = tables
            .modification_templates
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_template(
        &self,
        id: Uuid,
    ) -> Result<Option<ModificationTemplate>, ModificationPersistenceError> {
        let tables = self.lock().map_err(ModificationPersistenceError::query)?;
        Ok(tables.modification_templates.get(&id).cloned())
    }

    async fn find_templates(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ModificationTemplate>, ModificationPersistenceError> {
        let tables = self.lock().map_err(ModificationPersistenceError::query)?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.modification_templates.get(id).cloned())
            .collect())
    }

    async fn insert_template(
        &self,
        template: &ModificationTemplate,
    ) -> Result<(), ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        tables
            .modification_templates
            .insert(template.id, template.clone());
        Ok(())
    }

    async fn update_template(
        &self,
        template: &ModificationTemplate,
    ) -> Result<(), ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        tables
            .modification_templates
            .insert(template.id, template.clone());
        Ok(())
    }

    async fn delete_template(&self, id: Uuid) -> Result<bool, ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        if !tables.modification_templates.contains_key(&id) {
            return Ok(false);
        }
        remove_templates(&mut tables, &[id]);
        Ok(true)
    }

    async fn list_assignments(
        &self,
        manufacturer_id: Uuid,
    ) -> Result<Vec<ModificationAssignment>, ModificationPersistenceError> {
        let tables = self.lock().map_err(ModificationPersistenceError::query)?;
        let mut rows: Vec<ModificationAssignment> = tables
            .modification_assignments
            .values()
            .filter(|a| a.manufacturer_id == manufacturer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn insert_assignment(
        &self,
        assignment: &ModificationAssignment,
    ) -> Result<(), ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        tables
            .modification_assignments
            .insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<bool, ModificationPersistenceError> {
        let mut tables = self.lock().map_err(ModificationPersistenceError::query)?;
        Ok(tables.modification_assignments.remove(&id).is_some())
    }
}
