//! Port for modification categories, templates and assignments.
//!
//! Deleting a template removes its assignments. Deleting a category applies
//! the requested [`CategoryDeleteMode`] to its templates in the same unit of
//! work.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::modification::{
    CategoryDeleteMode, ModificationAssignment, ModificationCategory, ModificationTemplate, Owner,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by modification repository adapters.
    pub enum ModificationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "modification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "modification repository query failed: {message}",
        /// [`CategoryDeleteMode::Only`] hit a category that still holds templates.
        CategoryNotEmpty { category_id: Uuid } =>
            "modification category {category_id} still holds templates",
    }
}

impl From<ModificationPersistenceError> for Error {
    fn from(error: ModificationPersistenceError) -> Self {
        match error {
            ModificationPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("modification repository unavailable: {message}"))
            }
            ModificationPersistenceError::Query { message } => {
                Self::internal(format!("modification repository error: {message}"))
            }
            ModificationPersistenceError::CategoryNotEmpty { .. } => Self::invalid_request(
                "category still holds modifications; delete them with it or move them first",
            ),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModificationRepository: Send + Sync {
    /// Categories of one owner by `order_index`, then name.
    async fn list_categories(
        &self,
        owner: Owner,
    ) -> Result<Vec<ModificationCategory>, ModificationPersistenceError>;

    async fn find_category(
        &self,
        id: Uuid,
    ) -> Result<Option<ModificationCategory>, ModificationPersistenceError>;

    async fn insert_category(
        &self,
        category: &ModificationCategory,
    ) -> Result<(), ModificationPersistenceError>;

    async fn update_category(
        &self,
        category: &ModificationCategory,
    ) -> Result<(), ModificationPersistenceError>;

    /// Remove a category. Returns `false` when it did not exist.
    async fn delete_category(
        &self,
        id: Uuid,
        mode: CategoryDeleteMode,
    ) -> Result<bool, ModificationPersistenceError>;

    /// Templates of one owner ordered by name.
    async fn list_templates(
        &self,
        owner: Owner,
    ) -> Result<Vec<ModificationTemplate>, ModificationPersistenceError>;

    async fn find_template(
        &self,
        id: Uuid,
    ) -> Result<Option<ModificationTemplate>, ModificationPersistenceError>;

    /// Fetch several templates at once; unknown ids are skipped.
    async fn find_templates(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ModificationTemplate>, ModificationPersistenceError>;

    async fn insert_template(
        &self,
        template: &ModificationTemplate,
    ) -> Result<(), ModificationPersistenceError>;

    async fn update_template(
        &self,
        template: &ModificationTemplate,
    ) -> Result<(), ModificationPersistenceError>;

    /// Remove a template and its assignments. Returns `false` when it did
    /// not exist.
    async fn delete_template(&self, id: Uuid) -> Result<bool, ModificationPersistenceError>;

    /// A manufacturer's assignments, most recently changed first.
    async fn list_assignments(
        &self,
        manufacturer_id: Uuid,
    ) -> Result<Vec<ModificationAssignment>, ModificationPersistenceError>;

    async fn insert_assignment(
        &self,
        assignment: &ModificationAssignment,
    ) -> Result<(), ModificationPersistenceError>;

    /// Remove an assignment. Returns `false` when it did not exist.
    async fn delete_assignment(&self, id: Uuid) -> Result<bool, ModificationPersistenceError>;
}
