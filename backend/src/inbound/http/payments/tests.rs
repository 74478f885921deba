//! Tests for payment handlers.

use super::*;
use crate::inbound::http::state::HttpStateOptions;
use crate::inbound::http::test_utils::{ADMIN_EMAIL, TestBackend, call_as, json_body, login};
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::json;

const SECRET: &str = "gateway-shared-secret";

async fn backend() -> TestBackend {
    TestBackend::with_options(HttpStateOptions {
        webhook_secret: Some(SECRET.to_owned()),
        ..HttpStateOptions::default()
    })
    .await
}

/// Create and accept a proposal, returning the order id.
async fn order<S>(app: &S, cookie: &Cookie<'static>) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let created = call_as(
        app,
        cookie,
        actix_test::TestRequest::post()
            .uri("/api/v1/proposals")
            .set_json(json!({ "grandTotal": "900" })),
    )
    .await;
    let id = json_body(created).await["id"]
        .as_str()
        .expect("id")
        .to_owned();
    let accepted = call_as(
        app,
        cookie,
        actix_test::TestRequest::post().uri(&format!("/api/v1/proposals/{id}/accept")),
    )
    .await;
    json_body(accepted).await["order"]["id"]
        .as_str()
        .expect("order id")
        .to_owned()
}

async fn pay<S>(app: &S, cookie: &Cookie<'static>, payload: Value) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    call_as(
        app,
        cookie,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments")
            .set_json(payload),
    )
    .await
}

#[actix_web::test]
async fn an_order_has_one_active_payment() {
    let backend = backend().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let order_id = order(&app, &cookie).await;

    let first = pay(&app, &cookie, json!({ "orderId": order_id, "amount": "250.00" })).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let body = json_body(first).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["currency"], "USD");

    let second = pay(&app, &cookie, json!({ "orderId": order_id, "amount": "10" })).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[case(json!({ "amount": "0" }), StatusCode::BAD_REQUEST)]
#[case(json!({ "amount": "10", "currency": "dollars" }), StatusCode::BAD_REQUEST)]
#[case(json!({ "amount": "10", "orderId": Uuid::nil() }), StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn invalid_payments_are_rejected(#[case] overrides: Value, #[case] expected: StatusCode) {
    let backend = backend().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let order_id = order(&app, &cookie).await;
    let mut payload = json!({ "orderId": order_id });
    if let (Some(target), Some(extra)) = (payload.as_object_mut(), overrides.as_object()) {
        target.extend(extra.clone());
    }

    let res = pay(&app, &cookie, payload).await;

    assert_eq!(res.status(), expected);
}

#[actix_web::test]
async fn apply_completes_once() {
    let backend = backend().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let order_id = order(&app, &cookie).await;
    let created = pay(&app, &cookie, json!({ "orderId": order_id, "amount": "900" })).await;
    let id = json_body(created).await["id"]
        .as_str()
        .expect("id")
        .to_owned();

    let applied = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/payments/{id}/apply"))
            .set_json(json!({ "transactionId": "tx_manual", "paymentMethod": "check" })),
    )
    .await;
    let first = json_body(applied).await;
    assert_eq!(first["status"], "completed");
    assert_eq!(first["paymentMethod"], "check");

    let again = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/payments/{id}/apply"))
            .set_json(json!({ "transactionId": "tx_other" })),
    )
    .await;
    let second = json_body(again).await;
    assert_eq!(second["transactionId"], "tx_manual");
    assert_eq!(second["paidAt"], first["paidAt"]);
}

#[actix_web::test]
async fn unknown_status_labels_are_rejected() {
    let backend = backend().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let order_id = order(&app, &cookie).await;
    let created = pay(&app, &cookie, json!({ "orderId": order_id, "amount": "900" })).await;
    let id = json_body(created).await["id"]
        .as_str()
        .expect("id")
        .to_owned();

    let res = call_as(
        &app,
        &cookie,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/payments/{id}/status"))
            .set_json(json!({ "status": "refunded" })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["details"]["code"], "invalid_status");
}

#[rstest]
#[case("success", "completed")]
#[case("failed", "failed")]
#[case("pending_review", "processing")]
#[actix_web::test]
async fn webhook_maps_gateway_outcomes(#[case] outcome: &str, #[case] status: &str) {
    let backend = backend().await;
    let app = actix_test::init_service(backend.app()).await;
    let cookie = login(&app, ADMIN_EMAIL).await;
    let order_id = order(&app, &cookie).await;
    pay(&app, &cookie, json!({ "orderId": order_id, "amount": "900" })).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/webhook")
            .insert_header((WEBHOOK_SECRET_HEADER, SECRET))
            .set_json(json!({ "orderId": order_id, "transactionId": "tx_42", "status": outcome }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["status"], status);
    assert_eq!(body["transactionId"], "tx_42");
    assert_eq!(body["gatewayResponse"]["status"], outcome);
}

#[rstest]
#[case(Some("wrong"), StatusCode::UNAUTHORIZED)]
#[case(None, StatusCode::UNAUTHORIZED)]
#[case(Some(SECRET), StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn webhook_checks_the_secret(#[case] secret: Option<&str>, #[case] expected: StatusCode) {
    let backend = backend().await;
    let app = actix_test::init_service(backend.app()).await;
    let mut request = actix_test::TestRequest::post()
        .uri("/api/v1/payments/webhook")
        .set_json(json!({ "transactionId": "tx_unknown", "status": "success" }));
    if let Some(secret) = secret {
        request = request.insert_header((WEBHOOK_SECRET_HEADER, secret));
    }

    let res = actix_test::call_service(&app, request.to_request()).await;

    assert_eq!(res.status(), expected);
}

#[actix_web::test]
async fn webhook_is_unavailable_without_a_secret() {
    let backend = TestBackend::new().await;
    let app = actix_test::init_service(backend.app()).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/webhook")
            .insert_header((WEBHOOK_SECRET_HEADER, SECRET))
            .set_json(json!({ "status": "success" }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
fn gateway_event_requires_a_status() {
    let err = gateway_event(json!({ "transactionId": "tx_1" })).expect_err("missing status");

    assert_eq!(
        err.details(),
        Some(&json!({ "field": "status", "code": "missing_status" }))
    );
}

#[rstest]
fn gateway_event_keeps_the_raw_body() {
    let raw = json!({ "transactionId": " tx_1 ", "orderId": "garbage", "status": "success", "fee": 3 });

    let event = gateway_event(raw.clone()).expect("event");

    assert_eq!(event.transaction_id.as_deref(), Some("tx_1"));
    assert_eq!(event.order_id, None);
    assert_eq!(event.raw, raw);
}
