//! Tests for proposal handlers.

use super::*;
use crate::domain::permissions::ModuleAccess;
use crate::inbound::http::test_utils::{ADMIN_EMAIL, TestBackend, call_as, json_body, login};
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::json;

async fn create<S>(app: &S, cookie: &Cookie<'static>, payload: Value) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = call_as(
        app,
        cookie,
        actix_test::TestRequest::post()
            .uri("/api/v1/proposals")
            .set_json(payload),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    json_body(res).await
}

async fn action<S>(app: &S, cookie: &Cookie<'static>, id: &str, verb: &str) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    call_as(
        app,
        cookie,
        actix_test::TestRequest::post().uri(&format!("/api/v1/proposals/{id}/{verb}")),
    )
    .await
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("id").to_owned()
}

#[actix_web::test]
async fn creating_with_name_and_email_records_the_customer() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;

    let proposal = create(
        &app,
        &cookie,
        json!({
            "customerName": "Jo Smith",
            "customerEmail": "jo@home.test",
            "manufacturerId": Uuid::new_v4().to_string(),
            "grandTotal": "1200.00"
        }),
    )
    .await;

    assert_eq!(proposal["status"], "draft");
    assert_eq!(proposal["kind"], "proposal");
    assert_eq!(proposal["manufacturerId"], Value::Null);
    assert!(
        proposal["number"]
            .as_str()
            .is_some_and(|n| n.starts_with("NJQ-001-"))
    );
    let customers = json_body(
        call_as(
            &app,
            &cookie,
            actix_test::TestRequest::get().uri("/api/v1/customers?search=jo@home.test"),
        )
        .await,
    )
    .await;
    assert_eq!(customers["items"][0]["id"], proposal["customerId"]);
}

#[rstest]
#[case("Follow up 1", "follow_up_1")]
#[case("Measurement Scheduled", "measurement_scheduled")]
#[case("", "draft")]
#[actix_web::test]
async fn legacy_status_labels_are_normalised(#[case] label: &str, #[case] stored: &str) {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;

    let proposal = create(&app, &cookie, json!({ "status": label })).await;

    assert_eq!(proposal["status"], stored);
    let listed = json_body(
        call_as(
            &app,
            &cookie,
            actix_test::TestRequest::get().uri(&format!("/api/v1/proposals?status={stored}")),
        )
        .await,
    )
    .await;
    assert_eq!(listed["pagination"]["totalItems"], 1);
}

#[rstest]
#[case(json!({ "status": "haggling" }))]
#[case(json!({ "grandTotal": "-5" }))]
#[actix_web::test]
async fn invalid_proposals_are_rejected(#[case] payload: Value) {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;

    let res = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::post()
            .uri("/api/v1/proposals")
            .set_json(payload),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_status_filter_names_the_field() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;

    let res = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::get().uri("/api/v1/proposals?status=haggling"),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["details"]["field"], "status");
}

#[actix_web::test]
async fn accepted_proposals_are_locked() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let id = id_of(&create(&app, &cookie, json!({ "grandTotal": "500" })).await);

    let accepted = action(&app, &cookie, &id, "accept").await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let body = json_body(accepted).await;
    assert_eq!(body["proposal"]["status"], "accepted");
    assert_eq!(body["proposal"]["kind"], "order");
    assert_eq!(body["proposal"]["isLocked"], true);
    assert_eq!(body["order"]["grandTotal"], "500");

    let again = action(&app, &cookie, &id, "accept").await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
    let edit = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/proposals/{id}"))
            .set_json(json!({ "description": "late change" })),
    )
    .await;
    assert_eq!(edit.status(), StatusCode::CONFLICT);
    let removed = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::delete().uri(&format!("/api/v1/proposals/{id}")),
    )
    .await;
    assert_eq!(removed.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn rejected_proposals_cannot_be_accepted() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let id = id_of(&create(&app, &cookie, json!({})).await);

    let rejected = action(&app, &cookie, &id, "reject").await;
    assert_eq!(rejected.status(), StatusCode::OK);
    assert_eq!(json_body(rejected).await["status"], "rejected");

    let res = action(&app, &cookie, &id, "accept").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn updates_cannot_accept_through_the_status_field() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let id = id_of(&create(&app, &cookie, json!({})).await);

    let res = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/proposals/{id}"))
            .set_json(json!({ "status": "accepted" })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn contractors_only_see_their_group() {
    let backend = TestBackend::new().await;
    let group = backend.seed_contractor_group(ModuleAccess::all()).await;
    backend.seed_user("crew@acme.test", "", Some(group)).await;
    let app = actix_test::init_service(backend.app()).await;
    let admin = login(&app, ADMIN_EMAIL).await;
    let crew = login(&app, "crew@acme.test").await;
    let house = id_of(&create(&app, &admin, json!({ "description": "house" })).await);
    let own = create(
        &app,
        &crew,
        json!({ "description": "ours", "ownerGroupId": Uuid::new_v4().to_string() }),
    )
    .await;
    assert_eq!(own["ownerGroupId"], json!(group));

    let listed = json_body(
        call_as(&app, &crew, actix_test::TestRequest::get().uri("/api/v1/proposals")).await,
    )
    .await;
    assert_eq!(listed["pagination"]["totalItems"], 1);
    assert_eq!(listed["items"][0]["description"], "ours");
    let foreign = call_as(
        &app,
        &crew,
        actix_test::TestRequest::get().uri(&format!("/api/v1/proposals/{house}")),
    )
    .await;
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn sharing_a_draft_marks_it_sent() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let id = id_of(&create(&app, &cookie, json!({})).await);

    let res = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/proposals/{id}/sessions"))
            .set_json(json!({ "recipientEmail": "jo@home.test" })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let share = json_body(res).await;
    let token = share["token"].as_str().expect("token");
    assert_eq!(token.len(), 32);
    assert_eq!(
        share["path"],
        json!(format!("/api/v1/public/proposals/{token}"))
    );
    let proposal = json_body(
        call_as(
            &app,
            &cookie,
            actix_test::TestRequest::get().uri(&format!("/api/v1/proposals/{id}")),
        )
        .await,
    )
    .await;
    assert_eq!(proposal["status"], "sent");
    assert!(proposal["sentAt"].is_string());
}

#[actix_web::test]
async fn share_rejects_a_malformed_recipient() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let id = id_of(&create(&app, &cookie, json!({})).await);

    let res = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/proposals/{id}/sessions"))
            .set_json(json!({ "recipientEmail": "not-an-email" })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
