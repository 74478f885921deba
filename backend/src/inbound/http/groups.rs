//! User group administration.
//!
//! ```text
//! GET    /api/v1/user-groups
//! POST   /api/v1/user-groups {"name":"Acme Installers","groupType":"contractor","modules":{"proposals":true}}
//! PUT    /api/v1/user-groups/{id}/multiplier {"value":"1.2","enabled":true}
//! GET    /api/v1/contractors
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::permissions::ModuleAccess;
use crate::domain::user_group::{
    ContractorOverview, GroupMultiplier, GroupStats, GroupType, UserGroup, UserGroupDraft,
};
use crate::domain::{ApiResult, Error};

use super::principal::CurrentUser;
use super::state::HttpState;
use super::validation::invalid_payload;

/// User group as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupBody {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "contractor")]
    pub group_type: GroupType,
    #[schema(value_type = Object)]
    pub modules: ModuleAccess,
    #[schema(value_type = Object)]
    pub multiplier: GroupMultiplier,
    #[schema(value_type = Object)]
    pub contractor_settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserGroup> for GroupBody {
    fn from(group: UserGroup) -> Self {
        Self {
            id: group.id,
            name: group.name,
            group_type: group.group_type,
            modules: group.modules,
            multiplier: group.multiplier,
            contractor_settings: group.contractor_settings,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}

/// Live member counts of a contractor group.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsBody {
    pub users: u64,
    pub customers: u64,
    pub proposals: u64,
}

impl From<GroupStats> for StatsBody {
    fn from(stats: GroupStats) -> Self {
        Self {
            users: stats.users,
            customers: stats.customers,
            proposals: stats.proposals,
        }
    }
}

/// Contractor group with its counts.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContractorBody {
    #[serde(flatten)]
    pub group: GroupBody,
    pub stats: StatsBody,
}

impl From<ContractorOverview> for ContractorBody {
    fn from(overview: ContractorOverview) -> Self {
        Self {
            group: overview.group.into(),
            stats: overview.stats.into(),
        }
    }
}

/// Create or replace a group.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub name: String,
    /// `standard` (default) or `contractor`.
    #[serde(default)]
    pub group_type: String,
    /// Module toggles; ignored for standard groups.
    #[schema(value_type = Option<Object>)]
    pub modules: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub contractor_settings: Option<Value>,
}

impl GroupRequest {
    fn into_draft(self) -> Result<UserGroupDraft, Error> {
        UserGroupDraft::try_new(
            &self.name,
            &self.group_type,
            self.modules.as_ref(),
            self.contractor_settings,
        )
        .map_err(invalid_payload)
    }
}

/// Multiplier update.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MultiplierRequest {
    #[schema(value_type = String, example = "1.20")]
    pub value: Decimal,
    pub enabled: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/user-groups",
    responses(
        (status = 200, description = "Groups", body = [GroupBody]),
        (status = 401, description = "Unauthorised", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "listUserGroups"
)]
#[get("/user-groups")]
pub async fn list_groups(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> ApiResult<web::Json<Vec<GroupBody>>> {
    let groups = state.groups.list(&user).await?;
    Ok(web::Json(groups.into_iter().map(GroupBody::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/user-groups/{id}",
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group", body = GroupBody),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "getUserGroup"
)]
#[get("/user-groups/{id}")]
pub async fn get_group(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<GroupBody>> {
    let group = state.groups.get(&user, path.into_inner()).await?;
    Ok(web::Json(group.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/user-groups",
    request_body = GroupRequest,
    responses(
        (status = 201, description = "Created", body = GroupBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "createUserGroup"
)]
#[post("/user-groups")]
pub async fn create_group(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<GroupRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner().into_draft()?;
    let group = state.groups.create(&user, draft).await?;
    Ok(HttpResponse::Created().json(GroupBody::from(group)))
}

#[utoipa::path(
    put,
    path = "/api/v1/user-groups/{id}",
    params(("id" = Uuid, Path, description = "Group id")),
    request_body = GroupRequest,
    responses(
        (status = 200, description = "Updated", body = GroupBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "updateUserGroup"
)]
#[put("/user-groups/{id}")]
pub async fn update_group(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<GroupRequest>,
) -> ApiResult<web::Json<GroupBody>> {
    let draft = payload.into_inner().into_draft()?;
    let group = state.groups.update(&user, path.into_inner(), draft).await?;
    Ok(web::Json(group.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/user-groups/{id}",
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "deleteUserGroup"
)]
#[delete("/user-groups/{id}")]
pub async fn delete_group(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.groups.delete(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/api/v1/user-groups/{id}/multiplier",
    params(("id" = Uuid, Path, description = "Group id")),
    request_body = MultiplierRequest,
    responses(
        (status = 200, description = "Updated", body = GroupBody),
        (status = 400, description = "Multiplier must be positive", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "setGroupMultiplier"
)]
#[put("/user-groups/{id}/multiplier")]
pub async fn set_multiplier(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<MultiplierRequest>,
) -> ApiResult<web::Json<GroupBody>> {
    let MultiplierRequest { value, enabled } = payload.into_inner();
    let group = state
        .groups
        .set_multiplier(&user, path.into_inner(), value, enabled)
        .await?;
    Ok(web::Json(group.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/contractors",
    responses(
        (status = 200, description = "Contractor groups, newest first", body = [ContractorBody]),
        (status = 401, description = "Unauthorised", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "listContractors"
)]
#[get("/contractors")]
pub async fn list_contractors(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> ApiResult<web::Json<Vec<ContractorBody>>> {
    let contractors = state.groups.contractors(&user).await?;
    Ok(web::Json(
        contractors.into_iter().map(ContractorBody::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/contractors/{id}",
    params(("id" = Uuid, Path, description = "Contractor group id")),
    responses(
        (status = 200, description = "Contractor group", body = ContractorBody),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["user-groups"],
    operation_id = "getContractor"
)]
#[get("/contractors/{id}")]
pub async fn get_contractor(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ContractorBody>> {
    let contractor = state.groups.contractor(&user, path.into_inner()).await?;
    Ok(web::Json(contractor.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{ADMIN_EMAIL, TestBackend, json_body, login};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::json;

    #[actix_web::test]
    async fn admin_creates_contractor_group_and_enables_multiplier() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/user-groups")
                .cookie(cookie.clone())
                .set_json(json!({
                    "name": "Acme Installers",
                    "groupType": "contractor",
                    "modules": { "proposals": true }
                }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let body = json_body(created).await;
        assert_eq!(body["groupType"], "contractor");
        assert_eq!(body["modules"]["proposals"], true);
        assert_eq!(body["multiplier"]["enabled"], false);
        let id = body["id"].as_str().expect("group id").to_owned();

        let updated = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/user-groups/{id}/multiplier"))
                .cookie(cookie)
                .set_json(json!({ "value": "1.2", "enabled": true }))
                .to_request(),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);
        let body = json_body(updated).await;
        assert_eq!(body["multiplier"], json!({ "value": "1.2", "enabled": true }));
    }

    #[rstest]
    #[case(json!({ "value": "0", "enabled": true }))]
    #[case(json!({ "value": "-1.5", "enabled": false }))]
    #[actix_web::test]
    async fn non_positive_multiplier_is_rejected(#[case] payload: Value) {
        let backend = TestBackend::new().await;
        let group_id = backend.seed_contractor_group(ModuleAccess::all()).await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/user-groups/{group_id}/multiplier"))
                .cookie(cookie)
                .set_json(payload)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn contractors_cannot_manage_groups() {
        let backend = TestBackend::new().await;
        let group_id = backend.seed_contractor_group(ModuleAccess::all()).await;
        backend.seed_user("crew@acme.test", "", Some(group_id)).await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, "crew@acme.test").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/user-groups")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn contractors_list_member_counts() {
        let backend = TestBackend::new().await;
        let group_id = backend.seed_contractor_group(ModuleAccess::all()).await;
        backend.seed_user("crew@acme.test", "", Some(group_id)).await;
        backend.seed_user("lead@acme.test", "", Some(group_id)).await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let listed = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/contractors")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(listed.status(), StatusCode::OK);
        let body = json_body(listed).await;
        assert_eq!(body[0]["id"], group_id.to_string());
        assert_eq!(body[0]["groupType"], "contractor");
        assert_eq!(body[0]["stats"], json!({ "users": 2, "customers": 0, "proposals": 0 }));

        let single = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/contractors/{group_id}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(single.status(), StatusCode::OK);
        assert_eq!(json_body(single).await["stats"]["users"], 2);
    }

    #[actix_web::test]
    async fn contractor_members_cannot_see_other_contractors() {
        let backend = TestBackend::new().await;
        let group_id = backend.seed_contractor_group(ModuleAccess::all()).await;
        backend.seed_user("crew@acme.test", "", Some(group_id)).await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, "crew@acme.test").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/contractors/{group_id}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
