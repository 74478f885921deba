//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::auth::hash_password;
use crate::domain::permissions::ModuleAccess;
use crate::domain::ports::{UserGroupRepository, UserRepository};
use crate::domain::user_group::{GroupMultiplier, GroupType, UserGroup};
use crate::domain::{EmailAddress, User, UserId};
use crate::outbound::memory::MemoryStore;

use super::configure;
use super::state::{HttpState, HttpStateOptions, HttpStatePorts};

pub const ADMIN_EMAIL: &str = "admin@shop.test";
pub const PASSWORD: &str = "correct-horse";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Extract the session cookie set by a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// In-memory backend seeded with one admin account.
pub struct TestBackend {
    pub store: Arc<MemoryStore>,
    pub state: web::Data<HttpState>,
}

impl TestBackend {
    pub async fn new() -> Self {
        Self::with_options(HttpStateOptions::default()).await
    }

    pub async fn with_options(options: HttpStateOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ports = HttpStatePorts::from_store(store.clone(), Arc::new(mockable::DefaultClock));
        let backend = Self {
            store,
            state: web::Data::new(HttpState::new(ports, options)),
        };
        backend.seed_user(ADMIN_EMAIL, "Admin", None).await;
        backend
    }

    /// Insert an account that signs in with [`PASSWORD`].
    pub async fn seed_user(&self, email: &str, role: &str, group_id: Option<Uuid>) -> UserId {
        let now = Utc::now();
        let user = User {
            id: UserId::random(),
            name: email.split('@').next().unwrap_or(email).to_owned(),
            email: EmailAddress::new(email).expect("fixture email"),
            role: role.to_owned(),
            group_id,
            location_id: None,
            password_hash: hash_password(PASSWORD).expect("hash fixture password"),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        UserRepository::insert(self.store.as_ref(), &user)
            .await
            .expect("insert fixture user");
        user.id
    }

    /// Insert a contractor group with the given modules.
    pub async fn seed_contractor_group(&self, modules: ModuleAccess) -> Uuid {
        let now = Utc::now();
        let group = UserGroup {
            id: Uuid::new_v4(),
            name: format!("contractor-{}", Uuid::new_v4().simple()),
            group_type: GroupType::Contractor,
            modules,
            multiplier: GroupMultiplier::disabled(),
            contractor_settings: Value::Null,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        UserGroupRepository::insert(self.store.as_ref(), &group)
            .await
            .expect("insert fixture group");
        group.id
    }

    /// Application with every route and the test session middleware.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(test_session_middleware())
            .configure(configure)
    }
}

/// Sign in and return the session cookie.
pub async fn login<S>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let response = test::call_service(app, request).await;
    assert!(response.status().is_success(), "login failed: {}", response.status());
    session_cookie(&response)
}

/// Read a JSON body.
pub async fn json_body(response: ServiceResponse) -> Value {
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

/// Send a request carrying the session cookie.
pub async fn call_as<S>(
    app: &S,
    cookie: &Cookie<'static>,
    request: test::TestRequest,
) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    test::call_service(app, request.cookie(cookie.clone()).to_request()).await
}
