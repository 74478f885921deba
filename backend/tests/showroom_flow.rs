//! End-to-end flow over the public router: a proposal is shared, accepted by
//! the customer, numbered as an order and paid through the gateway webhook.
//!
//! Runs against the in-memory store so no database is needed.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use cabinet_backend::domain::auth::hash_password;
use cabinet_backend::domain::ports::UserRepository;
use cabinet_backend::domain::{EmailAddress, User, UserId};
use cabinet_backend::inbound::http::configure;
use cabinet_backend::inbound::http::state::{HttpState, HttpStateOptions, HttpStatePorts};
use cabinet_backend::outbound::memory::MemoryStore;
use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const ADMIN_EMAIL: &str = "owner@showroom.test";
const PASSWORD: &str = "plinth-and-cornice";
const WEBHOOK_SECRET: &str = "gateway-shared-secret";

#[fixture]
fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

async fn seed_admin(store: &MemoryStore) {
    let now = Utc::now();
    let admin = User {
        id: UserId::random(),
        name: "Owner".to_owned(),
        email: EmailAddress::new(ADMIN_EMAIL).expect("fixture email"),
        role: "Admin".to_owned(),
        group_id: None,
        location_id: None,
        password_hash: hash_password(PASSWORD).expect("hash fixture password"),
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };
    UserRepository::insert(store, &admin)
        .await
        .expect("insert admin");
}

fn state(store: Arc<MemoryStore>) -> web::Data<HttpState> {
    let ports = HttpStatePorts::from_store(store, Arc::new(DefaultClock));
    let options = HttpStateOptions {
        webhook_secret: Some(WEBHOOK_SECRET.to_owned()),
        ..HttpStateOptions::default()
    };
    web::Data::new(HttpState::new(ports, options))
}

async fn body(response: ServiceResponse) -> Value {
    let bytes = test::read_body(response).await;
    serde_json::from_slice(&bytes).expect("JSON body")
}

async fn send<S>(app: &S, cookie: Option<&Cookie<'static>>, request: test::TestRequest) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = match cookie {
        Some(cookie) => request.cookie(cookie.clone()),
        None => request,
    };
    test::call_service(app, request.to_request()).await
}

#[rstest]
#[actix_web::test]
async fn shared_proposal_becomes_a_paid_order(store: Arc<MemoryStore>) {
    seed_admin(&store).await;
    let app = test::init_service(
        App::new()
            .app_data(state(store))
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                    .cookie_name("session".to_owned())
                    .cookie_secure(false)
                    .build(),
            )
            .configure(configure),
    )
    .await;

    let login = send(
        &app,
        None,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": PASSWORD })),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = login
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie");

    let created = send(
        &app,
        Some(&cookie),
        test::TestRequest::post().uri("/api/v1/proposals").set_json(json!({
            "customerName": "Avery Lane",
            "customerEmail": "avery@home.test",
            "grandTotal": "4250.00"
        })),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let proposal = body(created).await;
    let proposal_id = proposal["id"].as_str().expect("proposal id").to_owned();

    let shared = send(
        &app,
        Some(&cookie),
        test::TestRequest::post()
            .uri(&format!("/api/v1/proposals/{proposal_id}/sessions"))
            .set_json(json!({ "recipientEmail": "avery@home.test" })),
    )
    .await;
    assert_eq!(shared.status(), StatusCode::CREATED);
    let token = body(shared).await["token"]
        .as_str()
        .expect("share token")
        .to_owned();

    let public_view = send(
        &app,
        None,
        test::TestRequest::get().uri(&format!("/api/v1/public/proposals/{token}")),
    )
    .await;
    assert_eq!(public_view.status(), StatusCode::OK);
    assert_eq!(body(public_view).await["status"], "sent");

    let accepted = send(
        &app,
        None,
        test::TestRequest::post()
            .uri(&format!("/api/v1/public/proposals/{token}/accept"))
            .set_json(json!({ "name": "Avery Lane", "email": "avery@home.test" })),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let accepted = body(accepted).await;
    let order_number = accepted["orderNumber"].as_str().expect("order number");
    assert!(order_number.starts_with("NJ-001-"), "{order_number}");

    let again = send(
        &app,
        None,
        test::TestRequest::post()
            .uri(&format!("/api/v1/public/proposals/{token}/accept"))
            .set_json(json!({ "name": "Avery Lane", "email": "avery@home.test" })),
    )
    .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let orders = body(
        send(&app, Some(&cookie), test::TestRequest::get().uri("/api/v1/orders")).await,
    )
    .await;
    let order_id = orders["items"][0]["id"].as_str().expect("order id").to_owned();
    assert_eq!(orders["items"][0]["number"], order_number);

    let payment = send(
        &app,
        Some(&cookie),
        test::TestRequest::post()
            .uri("/api/v1/payments")
            .set_json(json!({ "orderId": order_id, "amount": "4250.00" })),
    )
    .await;
    assert_eq!(payment.status(), StatusCode::CREATED);
    assert_eq!(body(payment).await["status"], "pending");

    let callback = send(
        &app,
        None,
        test::TestRequest::post()
            .uri("/api/v1/payments/webhook")
            .insert_header(("X-Webhook-Secret", WEBHOOK_SECRET))
            .set_json(json!({ "orderId": order_id, "status": "success", "transactionId": "tx-991" })),
    )
    .await;
    assert_eq!(callback.status(), StatusCode::OK);
    let paid = body(callback).await;
    assert_eq!(paid["status"], "completed");
    assert_eq!(paid["transactionId"], "tx-991");
}

#[rstest]
#[case(None, StatusCode::UNAUTHORIZED)]
#[case(Some("wrong"), StatusCode::UNAUTHORIZED)]
#[actix_web::test]
async fn webhook_requires_the_shared_secret(
    store: Arc<MemoryStore>,
    #[case] secret: Option<&str>,
    #[case] expected: StatusCode,
) {
    let app = test::init_service(App::new().app_data(state(store)).configure(configure)).await;
    let mut request = test::TestRequest::post()
        .uri("/api/v1/payments/webhook")
        .set_json(json!({ "status": "success" }));
    if let Some(secret) = secret {
        request = request.insert_header(("X-Webhook-Secret", secret));
    }

    let response = send(&app, None, request).await;

    assert_eq!(response.status(), expected);
}
