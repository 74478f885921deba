//! Session lifecycle handlers.
//!
//! ```text
//! POST  /api/v1/auth/login  {"email":"ada@shop.test","password":"s3cret-pass"}
//! POST  /api/v1/auth/signup {"name":"Ada","email":"ada@shop.test","password":"s3cret-pass"}
//! GET   /api/v1/auth/me
//! PATCH /api/v1/auth/me     {"name":"Ada L."}
//! POST  /api/v1/auth/logout
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::services::ProfileUpdate;
use crate::domain::{ApiResult, LoginCredentials, PermissionSet, Principal, SignupDetails};

use super::groups::GroupBody;
use super::principal::CurrentUser;
use super::session::SessionContext;
use super::state::HttpState;
use super::users::UserBody;
use super::validation::credentials_error;

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@shop.test")]
    pub email: String,
    pub password: String,
}

/// Self-service registration body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Changes to the caller's own account.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// The signed-in caller with their effective permissions.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionBody {
    pub user: UserBody,
    pub group: Option<GroupBody>,
    /// Role label shown in the UI; contractors without a role report
    /// `Contractor`.
    pub role: String,
    #[schema(value_type = Vec<String>, example = json!(["proposals:read", "customers:read"]))]
    pub permissions: PermissionSet,
}

impl From<Principal> for SessionBody {
    fn from(principal: Principal) -> Self {
        let role = principal.display_role();
        let Principal {
            user,
            group,
            permissions,
            ..
        } = principal;
        Self {
            user: user.into(),
            group: group.map(GroupBody::from),
            role,
            permissions,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = SessionBody,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 401, description = "Invalid credentials or disabled account", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown email", body = super::schemas::ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<SessionBody>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(|err| credentials_error(&err))?;
    let principal = state.auth.login(&credentials).await?;
    session.persist_user(&principal.user_id())?;
    Ok(web::Json(principal.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionBody),
        (status = 400, description = "Invalid request or duplicate email", body = super::schemas::ErrorSchema),
        (status = 403, description = "Signup is disabled", body = super::schemas::ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/auth/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let details =
        SignupDetails::try_from_parts(&payload.name, &payload.email, &payload.password)
            .map_err(|err| credentials_error(&err))?;
    let principal = state.auth.signup(&details).await?;
    session.persist_user(&principal.user_id())?;
    Ok(HttpResponse::Created().json(SessionBody::from(principal)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current session", body = SessionBody),
        (status = 401, description = "Not signed in", body = super::schemas::ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn me(user: CurrentUser) -> web::Json<SessionBody> {
    web::Json(user.0.into())
}

#[utoipa::path(
    patch,
    path = "/api/v1/auth/me",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = SessionBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 401, description = "Not signed in", body = super::schemas::ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "updateProfile"
)]
#[patch("/auth/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<SessionBody>> {
    let ProfileRequest { name, password } = payload.into_inner();
    let principal = state
        .auth
        .update_profile(&user, ProfileUpdate { name, password })
        .await?;
    Ok(web::Json(principal.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permissions::ModuleAccess;
    use crate::inbound::http::state::HttpStateOptions;
    use crate::inbound::http::test_utils::{
        ADMIN_EMAIL, PASSWORD, TestBackend, json_body, login as sign_in, session_cookie,
    };
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use rstest_bdd_macros::{given, then};
    use serde_json::{Value, json};

    #[given("signup is disabled")]
    fn signup_disabled() -> HttpStateOptions {
        HttpStateOptions {
            signup_enabled: false,
            ..HttpStateOptions::default()
        }
    }

    #[given("signup is enabled")]
    fn signup_enabled() -> HttpStateOptions {
        HttpStateOptions::default()
    }

    async fn visitor_signs_up(options: HttpStateOptions) -> ServiceResponse {
        let backend = TestBackend::with_options(options).await;
        let app = actix_test::init_service(backend.app()).await;
        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/signup")
                .set_json(json!({
                    "name": "Visitor",
                    "email": "visitor@shop.test",
                    "password": "long-enough"
                }))
                .to_request(),
        )
        .await
    }

    #[then("the signup is forbidden")]
    fn signup_is_forbidden(status: StatusCode) {
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[then("the account is created")]
    fn account_is_created(status: StatusCode) {
        assert_eq!(status, StatusCode::CREATED);
    }

    #[rstest]
    #[actix_web::test]
    async fn signup_disabled_is_forbidden() {
        let response = visitor_signs_up(signup_disabled()).await;
        signup_is_forbidden(response.status());
    }

    #[rstest]
    #[actix_web::test]
    async fn signup_signs_the_visitor_in_with_the_default_role() {
        let response = visitor_signs_up(signup_enabled()).await;
        account_is_created(response.status());
        assert!(!session_cookie(&response).value().is_empty());
        let body = json_body(response).await;
        assert_eq!(body["role"], "User");
        assert_eq!(body["group"], Value::Null);
    }

    #[rstest]
    #[case(json!({ "email": "", "password": "x" }), "email", "empty_email")]
    #[case(json!({ "email": "ada@shop.test", "password": "" }), "password", "empty_password")]
    #[actix_web::test]
    async fn login_validation_names_the_field(
        #[case] payload: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(payload)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = json_body(res).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[rstest]
    #[case(ADMIN_EMAIL, "wrong-password", StatusCode::UNAUTHORIZED)]
    #[case("nobody@shop.test", PASSWORD, StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn login_failures_map_to_status(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: StatusCode,
    ) {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({ "email": email, "password": password }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn contractor_session_reports_module_permissions() {
        let backend = TestBackend::new().await;
        let group_id = backend
            .seed_contractor_group(ModuleAccess {
                proposals: true,
                ..ModuleAccess::default()
            })
            .await;
        backend.seed_user("crew@acme.test", "", Some(group_id)).await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = sign_in(&app, "crew@acme.test").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["role"], "Contractor");
        let permissions = body["permissions"].as_array().expect("permissions array");
        assert!(permissions.contains(&json!("proposals:read")));
        assert!(!permissions.contains(&json!("customers:read")));
    }

    #[actix_web::test]
    async fn logout_clears_the_session() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = sign_in(&app, ADMIN_EMAIL).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let cleared = session_cookie(&res);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .cookie(cleared)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn profile_update_changes_the_password() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = sign_in(&app, ADMIN_EMAIL).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri("/api/v1/auth/me")
                .cookie(cookie)
                .set_json(json!({ "name": "Head Admin", "password": "brand-new-pass" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["user"]["name"], "Head Admin");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({ "email": ADMIN_EMAIL, "password": "brand-new-pass" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
