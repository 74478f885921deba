//! Modification gallery, manufacturer templates and assignment handlers.
//!
//! ```text
//! GET    /api/v1/modifications/templates?scope=manufacturer&manufacturerId=…
//! POST   /api/v1/modifications/blueprints/{id}/use {"manufacturerId":"…","allowDuplicate":false}
//! POST   /api/v1/manufacturers/{id}/modification-assignments {"templateId":"…","scope":"style","targetStyle":"Shaker"}
//! DELETE /api/v1/modifications/categories/{id}?mode=move&moveTo=…
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::modification::{
    AssignmentDraft, AssignmentTarget, CategoryDeleteMode, CategoryDraft, CategoryScope,
    ModificationAssignment, ModificationCategory, ModificationTemplate, Owner, TemplateDraft,
};
use crate::domain::services::{BlueprintCopy, ItemModification};
use crate::domain::{ApiResult, Error};

use super::principal::CurrentUser;
use super::state::HttpState;
use super::validation::{FieldName, field_error, invalid_payload};

/// Selects the gallery or one manufacturer.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct OwnerQuery {
    /// `gallery` (default) or `manufacturer`.
    #[param(value_type = Option<String>)]
    pub scope: Option<CategoryScope>,
    pub manufacturer_id: Option<Uuid>,
}

impl TryFrom<OwnerQuery> for Owner {
    type Error = Error;

    fn try_from(query: OwnerQuery) -> Result<Self, Self::Error> {
        Owner::try_new(query.scope.unwrap_or_default(), query.manufacturer_id)
            .map_err(invalid_payload)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBody {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "manufacturer")]
    pub scope: CategoryScope,
    pub manufacturer_id: Option<Uuid>,
    pub order_index: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ModificationCategory> for CategoryBody {
    fn from(category: ModificationCategory) -> Self {
        Self {
            id: category.id,
            name: category.name,
            scope: category.owner.scope(),
            manufacturer_id: category.owner.manufacturer_id(),
            order_index: category.order_index,
            description: category.description,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Category fields. Scope and manufacturer are only read on creation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub order_index: i32,
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "gallery")]
    pub scope: Option<CategoryScope>,
    pub manufacturer_id: Option<Uuid>,
}

impl CategoryRequest {
    fn draft(&self) -> Result<CategoryDraft, Error> {
        CategoryDraft::try_new(&self.name, self.order_index, self.description.as_deref())
            .map_err(invalid_payload)
    }

    fn owner(&self) -> Result<Owner, Error> {
        Owner::try_new(self.scope.unwrap_or_default(), self.manufacturer_id).map_err(invalid_payload)
    }
}

/// How to handle a deleted category's templates.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct DeleteCategoryQuery {
    /// `only` (default), `with_templates` or `move`.
    pub mode: Option<String>,
    /// Target category for `move`.
    pub move_to: Option<Uuid>,
}

impl TryFrom<DeleteCategoryQuery> for CategoryDeleteMode {
    type Error = Error;

    fn try_from(query: DeleteCategoryQuery) -> Result<Self, Self::Error> {
        match query.mode.as_deref().map(str::trim).unwrap_or("only") {
            "" | "only" => Ok(Self::Only),
            "with_templates" => Ok(Self::WithTemplates),
            "move" => query.move_to.map(Self::MoveTo).ok_or_else(|| {
                field_error(
                    FieldName::new("moveTo"),
                    "missing_target",
                    "moveTo is required when mode is move",
                )
            }),
            other => Err(field_error(
                FieldName::new("mode"),
                "unknown_mode",
                format!("unknown delete mode {other}"),
            )),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBody {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    #[schema(value_type = String, example = "manufacturer")]
    pub scope: CategoryScope,
    pub manufacturer_id: Option<Uuid>,
    #[schema(value_type = Option<String>, example = "45.00")]
    pub price: Option<Decimal>,
    pub is_ready: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ModificationTemplate> for TemplateBody {
    fn from(template: ModificationTemplate) -> Self {
        Self {
            id: template.id,
            category_id: template.category_id,
            name: template.name,
            scope: template.owner.scope(),
            manufacturer_id: template.owner.manufacturer_id(),
            price: template.price,
            is_ready: template.is_ready,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

/// Template fields. Gallery blueprints must not carry a price.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub name: String,
    pub category_id: Option<Uuid>,
    #[schema(value_type = Option<String>, example = "45.00")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "manufacturer")]
    pub scope: Option<CategoryScope>,
    pub manufacturer_id: Option<Uuid>,
}

impl TemplateRequest {
    fn draft(&self) -> Result<TemplateDraft, Error> {
        TemplateDraft::try_new(&self.name, self.category_id, self.price, self.is_ready)
            .map_err(invalid_payload)
    }

    fn owner(&self) -> Result<Owner, Error> {
        Owner::try_new(self.scope.unwrap_or_default(), self.manufacturer_id).map_err(invalid_payload)
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UseBlueprintRequest {
    pub manufacturer_id: Uuid,
    /// Manufacturer category for the copy.
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub allow_duplicate: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentBody {
    pub id: Uuid,
    pub template_id: Uuid,
    pub manufacturer_id: Uuid,
    pub scope: String,
    pub target_style: Option<String>,
    pub target_type: Option<String>,
    pub catalog_item_id: Option<Uuid>,
    #[schema(value_type = Option<String>, example = "35.00")]
    pub override_price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ModificationAssignment> for AssignmentBody {
    fn from(assignment: ModificationAssignment) -> Self {
        let target = &assignment.target;
        Self {
            id: assignment.id,
            template_id: assignment.template_id,
            manufacturer_id: assignment.manufacturer_id,
            scope: target.scope().to_owned(),
            target_style: target.style().map(str::to_owned),
            target_type: target.item_type().map(str::to_owned),
            catalog_item_id: target.catalog_item_id(),
            override_price: assignment.override_price,
            is_active: assignment.is_active,
            created_at: assignment.created_at,
            updated_at: assignment.updated_at,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Assignment fields. `scope` is `all`, `style`, `type` or `item`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub template_id: Uuid,
    #[serde(default)]
    pub scope: String,
    pub target_style: Option<String>,
    pub target_type: Option<String>,
    pub catalog_item_id: Option<Uuid>,
    #[schema(value_type = Option<String>, example = "35.00")]
    pub override_price: Option<Decimal>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl TryFrom<AssignmentRequest> for AssignmentDraft {
    type Error = Error;

    fn try_from(r: AssignmentRequest) -> Result<Self, Self::Error> {
        let target = AssignmentTarget::try_new(
            &r.scope,
            r.target_style.as_deref(),
            r.target_type.as_deref(),
            r.catalog_item_id,
        )
        .map_err(invalid_payload)?;
        AssignmentDraft::try_new(r.template_id, target, r.override_price, r.is_active)
            .map_err(invalid_payload)
    }
}

/// A template as offered on one catalog item.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemModificationBody {
    pub template: TemplateBody,
    #[schema(value_type = String, example = "35.00")]
    pub unit_price: Decimal,
}

impl From<ItemModification> for ItemModificationBody {
    fn from(offer: ItemModification) -> Self {
        Self {
            template: offer.template.into(),
            unit_price: offer.unit_price,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/modifications/categories",
    params(OwnerQuery),
    responses(
        (status = 200, description = "Categories", body = [CategoryBody]),
        (status = 400, description = "Invalid scope", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "listModificationCategories"
)]
#[get("/modifications/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    query: web::Query<OwnerQuery>,
) -> ApiResult<web::Json<Vec<CategoryBody>>> {
    let owner = Owner::try_from(query.into_inner())?;
    let categories = state.modifications.categories(owner).await?;
    Ok(web::Json(categories.into_iter().map(CategoryBody::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/modifications/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = CategoryBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "createModificationCategory"
)]
#[post("/modifications/categories")]
pub async fn create_category(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<CategoryRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let (owner, draft) = (request.owner()?, request.draft()?);
    let category = state
        .modifications
        .create_category(&user, owner, draft)
        .await?;
    Ok(HttpResponse::Created().json(CategoryBody::from(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/modifications/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = CategoryBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "updateModificationCategory"
)]
#[put("/modifications/categories/{id}")]
pub async fn update_category(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<CategoryRequest>,
) -> ApiResult<web::Json<CategoryBody>> {
    let draft = payload.draft()?;
    let category = state
        .modifications
        .update_category(&user, path.into_inner(), draft)
        .await?;
    Ok(web::Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modifications/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id"), DeleteCategoryQuery),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Category not empty or bad move target", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "deleteModificationCategory"
)]
#[delete("/modifications/categories/{id}")]
pub async fn delete_category(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    query: web::Query<DeleteCategoryQuery>,
) -> ApiResult<HttpResponse> {
    let mode = CategoryDeleteMode::try_from(query.into_inner())?;
    state
        .modifications
        .delete_category(&user, path.into_inner(), mode)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/modifications/templates",
    params(OwnerQuery),
    responses(
        (status = 200, description = "Templates", body = [TemplateBody]),
        (status = 400, description = "Invalid scope", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "listModificationTemplates"
)]
#[get("/modifications/templates")]
pub async fn list_templates(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    query: web::Query<OwnerQuery>,
) -> ApiResult<web::Json<Vec<TemplateBody>>> {
    let owner = Owner::try_from(query.into_inner())?;
    let templates = state.modifications.templates(owner).await?;
    Ok(web::Json(templates.into_iter().map(TemplateBody::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/modifications/templates",
    request_body = TemplateRequest,
    responses(
        (status = 201, description = "Created", body = TemplateBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "createModificationTemplate"
)]
#[post("/modifications/templates")]
pub async fn create_template(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<TemplateRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let (owner, draft) = (request.owner()?, request.draft()?);
    let template = state
        .modifications
        .create_template(&user, owner, draft)
        .await?;
    Ok(HttpResponse::Created().json(TemplateBody::from(template)))
}

#[utoipa::path(
    put,
    path = "/api/v1/modifications/templates/{id}",
    params(("id" = Uuid, Path, description = "Template id")),
    request_body = TemplateRequest,
    responses(
        (status = 200, description = "Updated", body = TemplateBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "updateModificationTemplate"
)]
#[put("/modifications/templates/{id}")]
pub async fn update_template(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<TemplateRequest>,
) -> ApiResult<web::Json<TemplateBody>> {
    let draft = payload.draft()?;
    let template = state
        .modifications
        .update_template(&user, path.into_inner(), draft)
        .await?;
    Ok(web::Json(template.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modifications/templates/{id}",
    params(("id" = Uuid, Path, description = "Template id")),
    responses(
        (status = 204, description = "Deleted with its assignments"),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "deleteModificationTemplate"
)]
#[delete("/modifications/templates/{id}")]
pub async fn delete_template(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .modifications
        .delete_template(&user, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/modifications/blueprints/{id}/use",
    params(("id" = Uuid, Path, description = "Blueprint id")),
    request_body = UseBlueprintRequest,
    responses(
        (status = 201, description = "Manufacturer copy", body = TemplateBody),
        (status = 404, description = "Unknown blueprint or manufacturer", body = super::schemas::ErrorSchema),
        (status = 409, description = "Name already used by the manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "useModificationBlueprint"
)]
#[post("/modifications/blueprints/{id}/use")]
pub async fn use_blueprint(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<UseBlueprintRequest>,
) -> ApiResult<HttpResponse> {
    let UseBlueprintRequest {
        manufacturer_id,
        category_id,
        allow_duplicate,
    } = payload.into_inner();
    let copy = BlueprintCopy {
        manufacturer_id,
        category_id,
        allow_duplicate,
    };
    let template = state
        .modifications
        .use_blueprint(&user, path.into_inner(), copy)
        .await?;
    Ok(HttpResponse::Created().json(TemplateBody::from(template)))
}

#[utoipa::path(
    get,
    path = "/api/v1/manufacturers/{id}/modification-assignments",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    responses(
        (status = 200, description = "Assignments, newest first", body = [AssignmentBody]),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "listModificationAssignments"
)]
#[get("/manufacturers/{id}/modification-assignments")]
pub async fn list_assignments(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Vec<AssignmentBody>>> {
    let assignments = state.modifications.assignments(path.into_inner()).await?;
    Ok(web::Json(
        assignments.into_iter().map(AssignmentBody::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/manufacturers/{id}/modification-assignments",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    request_body = AssignmentRequest,
    responses(
        (status = 201, description = "Created", body = AssignmentBody),
        (status = 400, description = "Invalid target or foreign template", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "createModificationAssignment"
)]
#[post("/manufacturers/{id}/modification-assignments")]
pub async fn create_assignment(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<AssignmentRequest>,
) -> ApiResult<HttpResponse> {
    let draft = AssignmentDraft::try_from(payload.into_inner())?;
    let assignment = state
        .modifications
        .create_assignment(&user, path.into_inner(), draft)
        .await?;
    Ok(HttpResponse::Created().json(AssignmentBody::from(assignment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modifications/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "deleteModificationAssignment"
)]
#[delete("/modifications/assignments/{id}")]
pub async fn delete_assignment(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .modifications
        .delete_assignment(&user, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/manufacturers/catalog/{item}/modifications",
    params(("item" = Uuid, Path, description = "Catalog item id")),
    responses(
        (status = 200, description = "Templates offered on the item", body = [ItemModificationBody]),
        (status = 404, description = "Unknown item", body = super::schemas::ErrorSchema)
    ),
    tags = ["modifications"],
    operation_id = "listItemModifications"
)]
#[get("/manufacturers/catalog/{item}/modifications")]
pub async fn item_modifications(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Vec<ItemModificationBody>>> {
    let offers = state.modifications.for_item(path.into_inner()).await?;
    Ok(web::Json(
        offers.into_iter().map(ItemModificationBody::from).collect(),
    ))
}
