//! Dashboard handlers.

use actix_web::{get, web};

use crate::domain::dashboard::{Counts, DashboardSummary};
use crate::domain::ApiResult;

use super::principal::CurrentUser;
use super::proposals::ProposalBody;
use super::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/counts",
    responses(
        (status = 200, description = "Active proposal and order counts", body = super::schemas::CountsSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "dashboardCounts"
)]
#[get("/dashboard/counts")]
pub async fn counts(state: web::Data<HttpState>, user: CurrentUser) -> ApiResult<web::Json<Counts>> {
    Ok(web::Json(state.dashboard.counts(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/latest-proposals",
    responses(
        (status = 200, description = "Ten most recently updated proposals", body = [ProposalBody]),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "latestProposals"
)]
#[get("/dashboard/latest-proposals")]
pub async fn latest_proposals(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> ApiResult<web::Json<Vec<ProposalBody>>> {
    let latest = state.dashboard.latest(&user).await?;
    Ok(web::Json(latest.into_iter().map(ProposalBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    responses(
        (status = 200, description = "Counts, metrics, pipeline and follow-ups", body = super::schemas::DashboardSummarySchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "dashboardSummary"
)]
#[get("/dashboard/summary")]
pub async fn summary(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> ApiResult<web::Json<DashboardSummary>> {
    Ok(web::Json(state.dashboard.summary(&user).await?))
}

#[cfg(test)]
mod tests {
    use crate::domain::permissions::ModuleAccess;
    use crate::inbound::http::test_utils::{ADMIN_EMAIL, TestBackend, call_as, json_body, login};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;

    #[actix_web::test]
    async fn counts_track_active_proposals_and_orders() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;
        let mut ids = Vec::new();
        for total in ["100", "200", "300"] {
            let res = call_as(
                &app,
                &cookie,
                actix_test::TestRequest::post()
                    .uri("/api/v1/proposals")
                    .set_json(json!({ "grandTotal": total })),
            )
            .await;
            ids.push(json_body(res).await["id"].as_str().expect("id").to_owned());
        }
        call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post().uri(&format!("/api/v1/proposals/{}/accept", ids[0])),
        )
        .await;
        call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post().uri(&format!("/api/v1/proposals/{}/reject", ids[1])),
        )
        .await;

        let counts = json_body(
            call_as(
                &app,
                &cookie,
                actix_test::TestRequest::get().uri("/api/v1/dashboard/counts"),
            )
            .await,
        )
        .await;

        assert_eq!(counts, json!({ "activeProposals": 1, "activeOrders": 1 }));
        let latest = json_body(
            call_as(
                &app,
                &cookie,
                actix_test::TestRequest::get().uri("/api/v1/dashboard/latest-proposals"),
            )
            .await,
        )
        .await;
        assert_eq!(latest.as_array().map(Vec::len), Some(3));
    }

    #[rstest]
    #[case(ModuleAccess { dashboard: true, ..ModuleAccess::default() }, StatusCode::OK)]
    #[case(ModuleAccess { proposals: true, ..ModuleAccess::default() }, StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn contractors_need_the_dashboard_module(
        #[case] modules: ModuleAccess,
        #[case] expected: StatusCode,
    ) {
        let backend = TestBackend::new().await;
        let group = backend.seed_contractor_group(modules).await;
        backend.seed_user("crew@acme.test", "", Some(group)).await;
        let app = actix_test::init_service(backend.app()).await;
        let crew = login(&app, "crew@acme.test").await;

        let res = call_as(
            &app,
            &crew,
            actix_test::TestRequest::get().uri("/api/v1/dashboard/summary"),
        )
        .await;

        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn summary_lists_metrics_for_an_empty_shop() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let res = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::get().uri("/api/v1/dashboard/summary"),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["counts"]["activeProposals"], 0);
        assert!(body["metrics"].is_array());
        assert_eq!(body["tasks"], json!([]));
    }
}
