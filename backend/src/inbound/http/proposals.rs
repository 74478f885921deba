//! Proposal handlers.
//!
//! ```text
//! POST /api/v1/proposals {"customerName":"Jo","customerEmail":"jo@home.test","grandTotal":"1200"}
//! POST /api/v1/proposals/{id}/accept
//! POST /api/v1/proposals/{id}/sessions {"recipientEmail":"jo@home.test"}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Paginated;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::proposal::{
    Proposal, ProposalDraft, ProposalFilter, ProposalInput, ProposalKind, ProposalStatus,
};
use crate::domain::services::SharedProposal;
use crate::domain::{ApiResult, Error};

use super::orders::OrderBody;
use super::principal::CurrentUser;
use super::schemas::PageBody;
use super::state::HttpState;
use super::validation::{
    FieldName, field_error, invalid_payload, lenient_uuid, optional_uuid, page_request,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalBody {
    pub id: Uuid,
    #[schema(example = "NJQ-004-031525")]
    pub number: Option<String>,
    pub customer_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub owner_group_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub created_by: Option<String>,
    #[schema(value_type = Option<String>)]
    pub designer_id: Option<String>,
    pub sales_rep: Option<String>,
    pub lead_source: Option<String>,
    pub location_id: Option<Uuid>,
    #[schema(value_type = String, example = "proposal")]
    pub kind: ProposalKind,
    #[schema(value_type = String, example = "follow_up_1")]
    pub status: ProposalStatus,
    pub date: DateTime<Utc>,
    pub follow_up_dates: Vec<DateTime<Utc>>,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub manufacturers_data: Value,
    #[schema(value_type = String)]
    pub grand_total: Decimal,
    pub is_locked: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Proposal> for ProposalBody {
    fn from(p: Proposal) -> Self {
        let grand_total = p.total();
        Self {
            id: p.id,
            number: p.number,
            customer_id: p.customer_id,
            manufacturer_id: p.manufacturer_id,
            owner_group_id: p.owner_group_id,
            created_by: p.created_by.map(|id| id.to_string()),
            designer_id: p.designer_id.map(|id| id.to_string()),
            sales_rep: p.sales_rep,
            lead_source: p.lead_source,
            location_id: p.location_id,
            kind: p.kind,
            status: p.status,
            date: p.date,
            follow_up_dates: p.follow_up_dates,
            description: p.description,
            manufacturers_data: p.manufacturers_data,
            grand_total,
            is_locked: p.is_locked,
            accepted_at: p.accepted_at,
            accepted_by: p.accepted_by,
            sent_at: p.sent_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Create or replace a proposal.
///
/// `customerId` wins over `customerName`/`customerEmail`; a name and email
/// find or create the customer in the owner group.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub manufacturer_id: Option<String>,
    pub designer_id: Option<String>,
    pub sales_rep: Option<String>,
    pub lead_source: Option<String>,
    pub location_id: Option<String>,
    pub owner_group_id: Option<String>,
    /// Defaults to `draft`. Older labels such as `Follow up 1` are accepted.
    pub status: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub follow_up_dates: Vec<DateTime<Utc>>,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub manufacturers_data: Option<Value>,
    #[schema(value_type = Option<String>, example = "1200.00")]
    pub grand_total: Option<Decimal>,
}

impl TryFrom<ProposalRequest> for ProposalDraft {
    type Error = Error;

    fn try_from(r: ProposalRequest) -> Result<Self, Self::Error> {
        let lenient = |raw: Option<String>| lenient_uuid(raw.as_deref());
        let input = ProposalInput {
            customer_id: lenient(r.customer_id),
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            manufacturer_id: lenient(r.manufacturer_id),
            designer_id: r.designer_id,
            sales_rep: r.sales_rep,
            lead_source: r.lead_source,
            location_id: lenient(r.location_id),
            owner_group_id: lenient(r.owner_group_id),
            status: r.status,
            date: r.date,
            follow_up_dates: r.follow_up_dates,
            description: r.description,
            manufacturers_data: r.manufacturers_data,
            grand_total: r.grand_total,
        };
        ProposalDraft::try_new(input).map_err(invalid_payload)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct ProposalQuery {
    pub status: Option<String>,
    /// `proposal` or `order`.
    pub kind: Option<String>,
    pub customer_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProposalQuery {
    fn filter(&self) -> Result<ProposalFilter, Error> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| {
                ProposalStatus::parse(raw).map_err(|err| {
                    field_error(FieldName::new("status"), "invalid_status", err.to_string())
                })
            })
            .transpose()?;
        Ok(ProposalFilter {
            group_id: None,
            status,
            kind: self.kind.as_deref().map(ProposalKind::from_stored),
            customer_id: optional_uuid(self.customer_id.as_deref(), FieldName::new("customerId"))?,
            ..ProposalFilter::default()
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptedBody {
    pub proposal: ProposalBody,
    pub order: OrderBody,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub recipient_email: Option<String>,
}

/// A freshly opened share link. The token is only ever returned here.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareBody {
    pub token: String,
    /// Path of the public view for this token.
    pub path: String,
    pub expires_at: DateTime<Utc>,
}

impl From<SharedProposal> for ShareBody {
    fn from(shared: SharedProposal) -> Self {
        let token = shared.token.as_str().to_owned();
        Self {
            path: format!("/api/v1/public/proposals/{token}"),
            token,
            expires_at: shared.session.expires_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/proposals",
    params(ProposalQuery),
    responses(
        (status = 200, description = "Proposals, newest first", body = PageBody<ProposalBody>),
        (status = 400, description = "Invalid filter", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "listProposals"
)]
#[get("/proposals")]
pub async fn list_proposals(
    state: web::Data<HttpState>,
    user: CurrentUser,
    query: web::Query<ProposalQuery>,
) -> ApiResult<web::Json<Paginated<ProposalBody>>> {
    let filter = query.filter()?;
    let page = page_request(query.page, query.limit)?;
    let proposals = state.proposals.list(&user, filter, page).await?;
    Ok(web::Json(proposals.map(ProposalBody::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/proposals/{id}",
    params(("id" = Uuid, Path, description = "Proposal id")),
    responses(
        (status = 200, description = "Proposal", body = ProposalBody),
        (status = 403, description = "Owned by another group", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "getProposal"
)]
#[get("/proposals/{id}")]
pub async fn get_proposal(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ProposalBody>> {
    let proposal = state.proposals.get(&user, path.into_inner()).await?;
    Ok(web::Json(proposal.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals",
    request_body = ProposalRequest,
    responses(
        (status = 201, description = "Created", body = ProposalBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "createProposal"
)]
#[post("/proposals")]
pub async fn create_proposal(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<ProposalRequest>,
) -> ApiResult<HttpResponse> {
    let draft = ProposalDraft::try_from(payload.into_inner())?;
    let proposal = state.proposals.create(&user, draft).await?;
    Ok(HttpResponse::Created().json(ProposalBody::from(proposal)))
}

#[utoipa::path(
    put,
    path = "/api/v1/proposals/{id}",
    params(("id" = Uuid, Path, description = "Proposal id")),
    request_body = ProposalRequest,
    responses(
        (status = 200, description = "Updated", body = ProposalBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema),
        (status = 409, description = "Locked or finished", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "updateProposal"
)]
#[put("/proposals/{id}")]
pub async fn update_proposal(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<ProposalRequest>,
) -> ApiResult<web::Json<ProposalBody>> {
    let draft = ProposalDraft::try_from(payload.into_inner())?;
    let proposal = state
        .proposals
        .update(&user, path.into_inner(), draft)
        .await?;
    Ok(web::Json(proposal.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/proposals/{id}",
    params(("id" = Uuid, Path, description = "Proposal id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema),
        (status = 409, description = "Locked", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "deleteProposal"
)]
#[delete("/proposals/{id}")]
pub async fn delete_proposal(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.proposals.delete(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/{id}/reject",
    params(("id" = Uuid, Path, description = "Proposal id")),
    responses(
        (status = 200, description = "Rejected", body = ProposalBody),
        (status = 409, description = "Locked or finished", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "rejectProposal"
)]
#[post("/proposals/{id}/reject")]
pub async fn reject_proposal(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ProposalBody>> {
    let proposal = state.proposals.reject(&user, path.into_inner()).await?;
    Ok(web::Json(proposal.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/{id}/accept",
    params(("id" = Uuid, Path, description = "Proposal id")),
    responses(
        (status = 200, description = "Accepted; the order is numbered", body = AcceptedBody),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema),
        (status = 409, description = "Already accepted, locked or rejected", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "acceptProposal"
)]
#[post("/proposals/{id}/accept")]
pub async fn accept_proposal(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<AcceptedBody>> {
    let (proposal, order) = state.proposals.accept(&user, path.into_inner()).await?;
    Ok(web::Json(AcceptedBody {
        proposal: proposal.into(),
        order: order.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/proposals/{id}/sessions",
    params(("id" = Uuid, Path, description = "Proposal id")),
    request_body = ShareRequest,
    responses(
        (status = 201, description = "Share link opened", body = ShareBody),
        (status = 400, description = "Invalid recipient", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["proposals"],
    operation_id = "shareProposal"
)]
#[post("/proposals/{id}/sessions")]
pub async fn share_proposal(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: Option<web::Json<ShareRequest>>,
) -> ApiResult<HttpResponse> {
    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    let shared = state
        .proposals
        .share(&user, path.into_inner(), request.recipient_email.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(ShareBody::from(shared)))
}

#[cfg(test)]
mod tests;
