//! Customer handlers.
//!
//! Contractors only see their own group's customers; the service applies the
//! scope so these handlers stay thin.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::customer::{Customer, CustomerInput};
use crate::domain::ApiResult;

use super::principal::CurrentUser;
use super::schemas::PageBody;
use super::state::HttpState;
use super::validation::{lenient_uuid, page_request};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub home_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub company: Option<String>,
    pub customer_type: Option<String>,
    pub lead_source: Option<String>,
    pub note: Option<String>,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerBody {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email.map(String::from),
            mobile: c.mobile,
            home_phone: c.home_phone,
            address: c.address,
            city: c.city,
            state: c.state,
            zip: c.zip,
            company: c.company,
            customer_type: c.customer_type,
            lead_source: c.lead_source,
            note: c.note,
            group_id: c.group_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub home_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub company: Option<String>,
    pub customer_type: Option<String>,
    pub lead_source: Option<String>,
    pub note: Option<String>,
    /// Ignored for contractors, whose customers always belong to their group.
    pub group_id: Option<String>,
}

impl From<CustomerRequest> for CustomerInput {
    fn from(r: CustomerRequest) -> Self {
        Self {
            group_id: lenient_uuid(r.group_id.as_deref()),
            name: r.name,
            email: r.email,
            mobile: r.mobile,
            home_phone: r.home_phone,
            address: r.address,
            city: r.city,
            state: r.state,
            zip: r.zip,
            company: r.company,
            customer_type: r.customer_type,
            lead_source: r.lead_source,
            note: r.note,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CustomerQuery {
    /// Case-insensitive match on name, email or company.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(CustomerQuery),
    responses(
        (status = 200, description = "Customers", body = PageBody<CustomerBody>),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "listCustomers"
)]
#[get("/customers")]
pub async fn list_customers(
    state: web::Data<HttpState>,
    user: CurrentUser,
    query: web::Query<CustomerQuery>,
) -> ApiResult<web::Json<Paginated<CustomerBody>>> {
    let CustomerQuery {
        search,
        page,
        limit,
    } = query.into_inner();
    let page = page_request(page, limit)?;
    let customers = state.customers.list(&user, search, page).await?;
    Ok(web::Json(customers.map(CustomerBody::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = CustomerBody),
        (status = 403, description = "Owned by another group", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "getCustomer"
)]
#[get("/customers/{id}")]
pub async fn get_customer(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<CustomerBody>> {
    let customer = state.customers.get(&user, path.into_inner()).await?;
    Ok(web::Json(customer.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Created", body = CustomerBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "createCustomer"
)]
#[post("/customers")]
pub async fn create_customer(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<CustomerRequest>,
) -> ApiResult<HttpResponse> {
    let customer = state
        .customers
        .create(&user, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(CustomerBody::from(customer)))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Updated", body = CustomerBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Owned by another group", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "updateCustomer"
)]
#[put("/customers/{id}")]
pub async fn update_customer(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<CustomerRequest>,
) -> ApiResult<web::Json<CustomerBody>> {
    let customer = state
        .customers
        .update(&user, path.into_inner(), payload.into_inner().into())
        .await?;
    Ok(web::Json(customer.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["customers"],
    operation_id = "deleteCustomer"
)]
#[delete("/customers/{id}")]
pub async fn delete_customer(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.customers.delete(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
