//! Manufacturer and catalog handlers.
//!
//! ```text
//! GET  /api/v1/manufacturers
//! PUT  /api/v1/manufacturers/{id}/status {"isActive":false}
//! GET  /api/v1/manufacturers/{id}/catalog?style=Shaker&search=base
//! POST /api/v1/manufacturers/{id}/catalog/import {"items":[{"code":"B12","style":"Shaker","price":"120.00"}]}
//! PUT  /api/v1/manufacturers/catalog/{item}/assembly-cost {"type":"percentage","amount":"10","scope":"manufacturer"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Paginated;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::catalog::{
    AssemblyCost, AssemblyCostKind, AssemblyCostScope, CatalogFilter, CatalogItem,
    CatalogItemDraft, ImportSummary, validate_import,
};
use crate::domain::manufacturer::{Manufacturer, ManufacturerDraft, ManufacturerInput};
use crate::domain::{ApiResult, Error};

use super::principal::CurrentUser;
use super::schemas::PageBody;
use super::state::HttpState;
use super::users::PageParams;
use super::validation::{invalid_payload, page_request};

/// Manufacturer as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerBody {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    #[schema(value_type = String, example = "1.50")]
    pub cost_multiplier: Decimal,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Manufacturer> for ManufacturerBody {
    fn from(m: Manufacturer) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            address: m.address,
            website: m.website,
            is_active: m.is_active,
            cost_multiplier: m.cost_multiplier,
            instructions: m.instructions,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    /// Defaults to `1` when omitted.
    #[schema(value_type = Option<String>)]
    pub cost_multiplier: Option<Decimal>,
    pub instructions: Option<String>,
}

impl TryFrom<ManufacturerRequest> for ManufacturerDraft {
    type Error = Error;

    fn try_from(value: ManufacturerRequest) -> Result<Self, Self::Error> {
        Self::try_new(ManufacturerInput {
            name: value.name,
            email: value.email,
            phone: value.phone,
            address: value.address,
            website: value.website,
            cost_multiplier: value.cost_multiplier,
            instructions: value.instructions,
        })
        .map_err(invalid_payload)
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub is_active: bool,
}

/// Catalog entry as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemBody {
    pub id: Uuid,
    pub manufacturer_id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub style: String,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CatalogItem> for CatalogItemBody {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            manufacturer_id: item.manufacturer_id,
            code: item.code,
            description: item.description,
            style: item.style,
            item_type: item.item_type,
            price: item.price,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CatalogItemRequest {
    pub code: String,
    pub description: Option<String>,
    pub style: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
}

impl CatalogItemRequest {
    fn validate(&self) -> Result<CatalogItemDraft, crate::domain::catalog::CatalogValidationError> {
        CatalogItemDraft::try_new(
            &self.code,
            self.description.as_deref(),
            self.style.as_deref(),
            self.item_type.as_deref(),
            self.price,
        )
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ImportRequest {
    pub items: Vec<CatalogItemRequest>,
}

/// Catalog list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CatalogQuery {
    pub style: Option<String>,
    /// Substring match on code or description.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssemblyCostRequest {
    #[serde(rename = "type", default)]
    #[schema(value_type = String, example = "percentage")]
    pub kind: AssemblyCostKind,
    #[schema(value_type = String, example = "10")]
    pub amount: Decimal,
    /// `one` (default) or `manufacturer` to apply to every item of the
    /// item's manufacturer.
    #[serde(default)]
    #[schema(value_type = String, example = "one")]
    pub scope: AssemblyCostScope,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssemblyCostBody {
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: AssemblyCostKind,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

impl From<AssemblyCost> for AssemblyCostBody {
    fn from(cost: AssemblyCost) -> Self {
        Self {
            kind: cost.kind,
            amount: cost.amount,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/manufacturers",
    params(PageParams),
    responses(
        (status = 200, description = "Manufacturers", body = PageBody<ManufacturerBody>),
        (status = 401, description = "Unauthorised", body = super::schemas::ErrorSchema)
    ),
    tags = ["manufacturers"],
    operation_id = "listManufacturers"
)]
#[get("/manufacturers")]
pub async fn list_manufacturers(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    query: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<ManufacturerBody>>> {
    let page = page_request(query.page, query.limit)?;
    let manufacturers = state.catalog.list_manufacturers(page).await?;
    Ok(web::Json(manufacturers.map(ManufacturerBody::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/manufacturers/{id}",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    responses(
        (status = 200, description = "Manufacturer", body = ManufacturerBody),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["manufacturers"],
    operation_id = "getManufacturer"
)]
#[get("/manufacturers/{id}")]
pub async fn get_manufacturer(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ManufacturerBody>> {
    let manufacturer = state.catalog.manufacturer(path.into_inner()).await?;
    Ok(web::Json(manufacturer.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/manufacturers",
    request_body = ManufacturerRequest,
    responses(
        (status = 201, description = "Created", body = ManufacturerBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["manufacturers"],
    operation_id = "createManufacturer"
)]
#[post("/manufacturers")]
pub async fn create_manufacturer(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<ManufacturerRequest>,
) -> ApiResult<HttpResponse> {
    let draft = ManufacturerDraft::try_from(payload.into_inner())?;
    let manufacturer = state.catalog.create_manufacturer(&user, draft).await?;
    Ok(HttpResponse::Created().json(ManufacturerBody::from(manufacturer)))
}

#[utoipa::path(
    put,
    path = "/api/v1/manufacturers/{id}",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    request_body = ManufacturerRequest,
    responses(
        (status = 200, description = "Updated", body = ManufacturerBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["manufacturers"],
    operation_id = "updateManufacturer"
)]
#[put("/manufacturers/{id}")]
pub async fn update_manufacturer(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<ManufacturerRequest>,
) -> ApiResult<web::Json<ManufacturerBody>> {
    let draft = ManufacturerDraft::try_from(payload.into_inner())?;
    let manufacturer = state
        .catalog
        .update_manufacturer(&user, path.into_inner(), draft)
        .await?;
    Ok(web::Json(manufacturer.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/manufacturers/{id}/status",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Updated", body = ManufacturerBody),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["manufacturers"],
    operation_id = "setManufacturerStatus"
)]
#[put("/manufacturers/{id}/status")]
pub async fn set_manufacturer_status(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<StatusRequest>,
) -> ApiResult<web::Json<ManufacturerBody>> {
    let manufacturer = state
        .catalog
        .set_manufacturer_status(&user, path.into_inner(), payload.is_active)
        .await?;
    Ok(web::Json(manufacturer.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/manufacturers/{id}/catalog",
    params(("id" = Uuid, Path, description = "Manufacturer id"), CatalogQuery),
    responses(
        (status = 200, description = "Catalog page", body = PageBody<CatalogItemBody>),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["catalog"],
    operation_id = "listCatalog"
)]
#[get("/manufacturers/{id}/catalog")]
pub async fn list_items(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
    query: web::Query<CatalogQuery>,
) -> ApiResult<web::Json<Paginated<CatalogItemBody>>> {
    let CatalogQuery {
        style,
        search,
        page,
        limit,
    } = query.into_inner();
    let page = page_request(page, limit)?;
    let filter = CatalogFilter {
        style: style.filter(|s| !s.trim().is_empty()),
        search: search.filter(|s| !s.trim().is_empty()),
    };
    let items = state
        .catalog
        .list_items(path.into_inner(), &filter, page)
        .await?;
    Ok(web::Json(items.map(CatalogItemBody::from)))
}

#[utoipa::path(
    post,
    path = "/api/v1/manufacturers/{id}/catalog",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    request_body = CatalogItemRequest,
    responses(
        (status = 201, description = "Created", body = CatalogItemBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["catalog"],
    operation_id = "createCatalogItem"
)]
#[post("/manufacturers/{id}/catalog")]
pub async fn create_item(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<CatalogItemRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.validate().map_err(invalid_payload)?;
    let item = state
        .catalog
        .create_item(&user, path.into_inner(), draft)
        .await?;
    Ok(HttpResponse::Created().json(CatalogItemBody::from(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/manufacturers/catalog/{item}",
    params(("item" = Uuid, Path, description = "Catalog item id")),
    request_body = CatalogItemRequest,
    responses(
        (status = 200, description = "Updated", body = CatalogItemBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["catalog"],
    operation_id = "updateCatalogItem"
)]
#[put("/manufacturers/catalog/{item}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<CatalogItemRequest>,
) -> ApiResult<web::Json<CatalogItemBody>> {
    let draft = payload.validate().map_err(invalid_payload)?;
    let item = state
        .catalog
        .update_item(&user, path.into_inner(), draft)
        .await?;
    Ok(web::Json(item.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/manufacturers/{id}/catalog/import",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Rows upserted by code and style", body = super::schemas::ImportSummarySchema),
        (status = 400, description = "A row failed validation", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["catalog"],
    operation_id = "importCatalog"
)]
#[post("/manufacturers/{id}/catalog/import")]
pub async fn import_items(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<ImportRequest>,
) -> ApiResult<web::Json<ImportSummary>> {
    let rows = validate_import(payload.items.iter().map(CatalogItemRequest::validate))
        .map_err(invalid_payload)?;
    let summary = state.catalog.import(&user, path.into_inner(), rows).await?;
    Ok(web::Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/manufacturers/{id}/styles",
    params(("id" = Uuid, Path, description = "Manufacturer id")),
    responses(
        (status = 200, description = "Distinct styles", body = [String]),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["catalog"],
    operation_id = "listStyles"
)]
#[get("/manufacturers/{id}/styles")]
pub async fn list_styles(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Vec<String>>> {
    Ok(web::Json(state.catalog.styles(path.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/manufacturers/catalog/{item}/assembly-cost",
    params(("item" = Uuid, Path, description = "Catalog item id")),
    responses(
        (status = 200, description = "Assembly cost, or null when none is set", body = Option<AssemblyCostBody>),
        (status = 404, description = "Unknown item", body = super::schemas::ErrorSchema)
    ),
    tags = ["catalog"],
    operation_id = "getAssemblyCost"
)]
#[get("/manufacturers/catalog/{item}/assembly-cost")]
pub async fn get_assembly_cost(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Option<AssemblyCostBody>>> {
    let cost = state.catalog.assembly_cost(path.into_inner()).await?;
    Ok(web::Json(cost.map(AssemblyCostBody::from)))
}

#[utoipa::path(
    put,
    path = "/api/v1/manufacturers/catalog/{item}/assembly-cost",
    params(("item" = Uuid, Path, description = "Catalog item id")),
    request_body = AssemblyCostRequest,
    responses(
        (status = 200, description = "Number of items updated"),
        (status = 400, description = "Negative amount", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown item", body = super::schemas::ErrorSchema)
    ),
    tags = ["catalog"],
    operation_id = "setAssemblyCost"
)]
#[put("/manufacturers/catalog/{item}/assembly-cost")]
pub async fn set_assembly_cost(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<AssemblyCostRequest>,
) -> ApiResult<HttpResponse> {
    let AssemblyCostRequest {
        kind,
        amount,
        scope,
    } = payload.into_inner();
    let cost = AssemblyCost::try_new(kind, amount).map_err(invalid_payload)?;
    let updated = state
        .catalog
        .set_assembly_cost(&user, path.into_inner(), cost, scope)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}
