//! Payment handlers and the gateway callback.
//!
//! ```text
//! POST /api/v1/payments {"orderId":"…","amount":"250.00"}
//! PUT  /api/v1/payments/{id}/status {"status":"completed","transactionId":"tx_1"}
//! POST /api/v1/payments/webhook  (X-Webhook-Secret: …) {"transactionId":"tx_1","status":"success"}
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Paginated;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::payment::{GatewayEvent, Payment, PaymentDraft, PaymentFilter, PaymentStatus};
use crate::domain::{ApiResult, Error};

use super::principal::CurrentUser;
use super::schemas::PageBody;
use super::state::HttpState;
use super::validation::{
    FieldName, field_error, invalid_payload, lenient_uuid, optional_uuid, page_request,
};

/// Header carrying the shared gateway secret.
pub const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    pub id: Uuid,
    pub order_id: Uuid,
    #[schema(value_type = String, example = "250.00")]
    pub amount: Decimal,
    pub currency: String,
    #[schema(value_type = String, example = "pending")]
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub gateway_response: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub created_by: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentBody {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            order_id: p.order_id,
            amount: p.amount,
            currency: p.currency,
            status: p.status,
            payment_method: p.payment_method,
            transaction_id: p.transaction_id,
            gateway_response: p.gateway_response,
            created_by: p.created_by.map(|id| id.to_string()),
            paid_at: p.paid_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: Uuid,
    #[schema(value_type = String, example = "250.00")]
    pub amount: Decimal,
    /// Three-letter code; defaults to `USD`.
    pub currency: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    /// `pending`, `processing`, `completed`, `failed` or `cancelled`.
    pub status: String,
    pub transaction_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub gateway_response: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub status: Option<String>,
    pub order_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn parse_status(raw: &str) -> Result<PaymentStatus, Error> {
    raw.parse::<PaymentStatus>()
        .map_err(|err| field_error(FieldName::new("status"), "invalid_status", err.to_string()))
}

impl PaymentQuery {
    fn filter(&self) -> Result<PaymentFilter, Error> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_status)
            .transpose()?;
        Ok(PaymentFilter {
            group_id: None,
            status,
            order_id: optional_uuid(self.order_id.as_deref(), FieldName::new("orderId"))?,
        })
    }
}

/// Turn a raw callback body into a gateway event. The whole body is kept as
/// the gateway response.
fn gateway_event(raw: Value) -> Result<GatewayEvent, Error> {
    let text = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let status = text("status").ok_or_else(|| {
        field_error(FieldName::new("status"), "missing_status", "status is required")
    })?;
    Ok(GatewayEvent {
        transaction_id: text("transactionId"),
        order_id: lenient_uuid(text("orderId").as_deref()),
        status,
        raw,
    })
}

fn verify_secret(request: &HttpRequest, expected: Option<&str>) -> Result<(), Error> {
    let Some(expected) = expected else {
        return Err(Error::service_unavailable("payment webhook is not configured"));
    };
    let presented = request
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if Sha256::digest(presented.as_bytes()) != Sha256::digest(expected.as_bytes()) {
        warn!("payment webhook rejected: bad secret");
        return Err(Error::unauthorized("invalid webhook secret"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    params(("X-Webhook-Secret" = String, Header, description = "Shared gateway secret")),
    request_body(content = Object, description = "Gateway callback; `status` is required"),
    responses(
        (status = 200, description = "Recorded", body = PaymentBody),
        (status = 401, description = "Bad secret", body = super::schemas::ErrorSchema),
        (status = 404, description = "No matching payment", body = super::schemas::ErrorSchema),
        (status = 503, description = "Webhook not configured", body = super::schemas::ErrorSchema)
    ),
    tags = ["payments"],
    security([]),
    operation_id = "paymentWebhook"
)]
#[post("/payments/webhook")]
pub async fn payment_webhook(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<PaymentBody>> {
    verify_secret(&request, state.webhook_secret.as_deref())?;
    let event = gateway_event(payload.into_inner())?;
    let payment = state.payments.webhook(event).await?;
    Ok(web::Json(payment.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments",
    params(PaymentQuery),
    responses(
        (status = 200, description = "Payments", body = PageBody<PaymentBody>),
        (status = 400, description = "Invalid filter", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "listPayments"
)]
#[get("/payments")]
pub async fn list_payments(
    state: web::Data<HttpState>,
    user: CurrentUser,
    query: web::Query<PaymentQuery>,
) -> ApiResult<web::Json<Paginated<PaymentBody>>> {
    let filter = query.filter()?;
    let page = page_request(query.page, query.limit)?;
    let payments = state.payments.list(&user, filter, page).await?;
    Ok(web::Json(payments.map(PaymentBody::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment", body = PaymentBody),
        (status = 403, description = "Owned by another group", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "getPayment"
)]
#[get("/payments/{id}")]
pub async fn get_payment(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<PaymentBody>> {
    let payment = state.payments.get(&user, path.into_inner()).await?;
    Ok(web::Json(payment.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = PaymentRequest,
    responses(
        (status = 201, description = "Created", body = PaymentBody),
        (status = 400, description = "Invalid amount or an active payment exists", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown order", body = super::schemas::ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "createPayment"
)]
#[post("/payments")]
pub async fn create_payment(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<PaymentRequest>,
) -> ApiResult<HttpResponse> {
    let PaymentRequest {
        order_id,
        amount,
        currency,
        payment_method,
    } = payload.into_inner();
    let draft = PaymentDraft::try_new(
        order_id,
        amount,
        currency.as_deref(),
        payment_method.as_deref(),
    )
    .map_err(invalid_payload)?;
    let payment = state.payments.create(&user, draft).await?;
    Ok(HttpResponse::Created().json(PaymentBody::from(payment)))
}

#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}/status",
    params(("id" = Uuid, Path, description = "Payment id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Updated", body = PaymentBody),
        (status = 400, description = "Unknown status", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "updatePaymentStatus"
)]
#[put("/payments/{id}/status")]
pub async fn update_payment_status(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<StatusUpdateRequest>,
) -> ApiResult<web::Json<PaymentBody>> {
    let StatusUpdateRequest {
        status,
        transaction_id,
        gateway_response,
    } = payload.into_inner();
    let status = parse_status(&status)?;
    let payment = state
        .payments
        .update_status(
            &user,
            path.into_inner(),
            status,
            transaction_id,
            gateway_response,
        )
        .await?;
    Ok(web::Json(payment.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/apply",
    params(("id" = Uuid, Path, description = "Payment id")),
    request_body = ApplyRequest,
    responses(
        (status = 200, description = "Completed; repeated calls are no-ops", body = PaymentBody),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "applyPayment"
)]
#[post("/payments/{id}/apply")]
pub async fn apply_payment(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: Option<web::Json<ApplyRequest>>,
) -> ApiResult<web::Json<PaymentBody>> {
    let ApplyRequest {
        transaction_id,
        payment_method,
    } = payload.map(web::Json::into_inner).unwrap_or_default();
    let payment = state
        .payments
        .apply(&user, path.into_inner(), transaction_id, payment_method)
        .await?;
    Ok(web::Json(payment.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "deletePayment"
)]
#[delete("/payments/{id}")]
pub async fn delete_payment(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.payments.delete(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
