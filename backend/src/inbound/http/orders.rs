//! Order handlers. Orders are created only by accepting a proposal.

use actix_web::{get, web};
use chrono::{DateTime, NaiveDate, Utc};
use pagination::Paginated;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::order::Order;
use crate::domain::ApiResult;

use super::principal::CurrentUser;
use super::schemas::PageBody;
use super::state::HttpState;
use super::validation::{FieldName, optional_uuid, page_request};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub id: Uuid,
    pub proposal_id: Uuid,
    #[schema(example = "NJ-001-031525")]
    pub number: Option<String>,
    pub number_date: Option<NaiveDate>,
    pub number_seq: Option<u32>,
    pub owner_group_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub style_name: Option<String>,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub status: String,
    #[schema(value_type = String)]
    pub grand_total: Decimal,
    /// Proposal data captured at acceptance.
    #[schema(value_type = Object)]
    pub snapshot: Value,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderBody {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            proposal_id: order.proposal_id,
            number: order.number,
            number_date: order.number_date,
            number_seq: order.number_seq,
            owner_group_id: order.owner_group_id,
            customer_id: order.customer_id,
            manufacturer_id: order.manufacturer_id,
            style_name: order.style_name,
            accepted_by: order.accepted_by,
            accepted_at: order.accepted_at,
            status: order.status,
            grand_total: order.grand_total,
            snapshot: order.snapshot,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct OrderQuery {
    pub customer_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderQuery),
    responses(
        (status = 200, description = "Orders, newest first", body = PageBody<OrderBody>),
        (status = 400, description = "Invalid filter", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "listOrders"
)]
#[get("/orders")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    user: CurrentUser,
    query: web::Query<OrderQuery>,
) -> ApiResult<web::Json<Paginated<OrderBody>>> {
    let OrderQuery {
        customer_id,
        page,
        limit,
    } = query.into_inner();
    let customer_id = optional_uuid(customer_id.as_deref(), FieldName::new("customerId"))?;
    let page = page_request(page, limit)?;
    let orders = state.orders.list(&user, customer_id, page).await?;
    Ok(web::Json(orders.map(OrderBody::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderBody),
        (status = 403, description = "Owned by another group", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "getOrder"
)]
#[get("/orders/{id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<OrderBody>> {
    let order = state.orders.get(&user, path.into_inner()).await?;
    Ok(web::Json(order.into()))
}
