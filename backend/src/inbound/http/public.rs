//! Unauthenticated proposal views reached through share links.
//!
//! The token in the path is the only credential. Unknown and expired tokens
//! both answer 404.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::proposal::{Proposal, ProposalStatus};
use crate::domain::ApiResult;

use super::state::HttpState;

/// What a customer sees through a share link.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProposalBody {
    pub number: Option<String>,
    #[schema(value_type = String, example = "sent")]
    pub status: ProposalStatus,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub manufacturers_data: Value,
    #[schema(value_type = String)]
    pub grand_total: Decimal,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<String>,
}

impl From<Proposal> for PublicProposalBody {
    fn from(p: Proposal) -> Self {
        let grand_total = p.total();
        Self {
            number: p.number,
            status: p.status,
            date: p.date,
            description: p.description,
            manufacturers_data: p.manufacturers_data,
            grand_total,
            accepted_at: p.accepted_at,
            accepted_by: p.accepted_by,
        }
    }
}

/// Signature captured when a customer accepts.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignatureRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicAcceptBody {
    pub proposal: PublicProposalBody,
    #[schema(example = "NJ-001-031525")]
    pub order_number: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/public/proposals/{token}",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Shared proposal", body = PublicProposalBody),
        (status = 404, description = "Unknown or expired link", body = super::schemas::ErrorSchema)
    ),
    tags = ["public"],
    security([]),
    operation_id = "getSharedProposal"
)]
#[get("/public/proposals/{token}")]
pub async fn get_shared_proposal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PublicProposalBody>> {
    let proposal = state.proposals.resolve_share(&path.into_inner()).await?;
    Ok(web::Json(proposal.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/public/proposals/{token}/accept",
    params(("token" = String, Path, description = "Share token")),
    request_body = SignatureRequest,
    responses(
        (status = 200, description = "Accepted", body = PublicAcceptBody),
        (status = 400, description = "Missing name or malformed email", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown or expired link", body = super::schemas::ErrorSchema),
        (status = 409, description = "Already accepted or no longer open", body = super::schemas::ErrorSchema)
    ),
    tags = ["public"],
    security([]),
    operation_id = "acceptSharedProposal"
)]
#[post("/public/proposals/{token}/accept")]
pub async fn accept_shared_proposal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<SignatureRequest>,
) -> ApiResult<web::Json<PublicAcceptBody>> {
    let SignatureRequest { name, email } = payload.into_inner();
    let (proposal, order) = state
        .proposals
        .accept_public(&path.into_inner(), &name, &email)
        .await?;
    Ok(web::Json(PublicAcceptBody {
        proposal: proposal.into(),
        order_number: order.number,
    }))
}

#[cfg(test)]
mod tests {
    use crate::inbound::http::test_utils::{ADMIN_EMAIL, TestBackend, call_as, json_body, login};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn shared_token(backend: &TestBackend) -> String {
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;
        let created = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post()
                .uri("/api/v1/proposals")
                .set_json(json!({ "description": "Kitchen", "grandTotal": "900" })),
        )
        .await;
        let id = json_body(created).await["id"]
            .as_str()
            .expect("id")
            .to_owned();
        let shared = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post().uri(&format!("/api/v1/proposals/{id}/sessions")),
        )
        .await;
        json_body(shared).await["token"]
            .as_str()
            .expect("token")
            .to_owned()
    }

    #[actix_web::test]
    async fn customer_views_and_signs_without_a_session() {
        let backend = TestBackend::new().await;
        let token = shared_token(&backend).await;
        let app = actix_test::init_service(backend.app()).await;

        let view = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/public/proposals/{token}"))
                .to_request(),
        )
        .await;
        assert_eq!(view.status(), StatusCode::OK);
        let body = json_body(view).await;
        assert_eq!(body["status"], "sent");
        assert_eq!(body["grandTotal"], "900");
        assert!(body.get("ownerGroupId").is_none());

        let signed = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/public/proposals/{token}/accept"))
                .set_json(json!({ "name": "Jo Smith", "email": "jo@home.test" }))
                .to_request(),
        )
        .await;
        assert_eq!(signed.status(), StatusCode::OK);
        let body = json_body(signed).await;
        assert_eq!(body["proposal"]["acceptedBy"], "Jo Smith <jo@home.test>");
        assert!(
            body["orderNumber"]
                .as_str()
                .is_some_and(|n| n.starts_with("NJ-"))
        );

        let again = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/public/proposals/{token}/accept"))
                .set_json(json!({ "name": "Jo Smith", "email": "jo@home.test" }))
                .to_request(),
        )
        .await;
        assert_eq!(again.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[case(json!({ "name": " ", "email": "jo@home.test" }))]
    #[case(json!({ "name": "Jo", "email": "nope" }))]
    #[actix_web::test]
    async fn signature_must_be_complete(#[case] payload: Value) {
        let backend = TestBackend::new().await;
        let token = shared_token(&backend).await;
        let app = actix_test::init_service(backend.app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/public/proposals/{token}/accept"))
                .set_json(payload)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_tokens_are_not_found() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/public/proposals/not-a-real-token")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
