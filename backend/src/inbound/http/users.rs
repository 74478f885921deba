//! User administration handlers.
//!
//! ```text
//! GET    /api/v1/users?page=1&limit=20
//! POST   /api/v1/users {"name":"Ada","email":"ada@shop.test","password":"s3cret-pass","role":"Sales"}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::services::UserUpdate;
use crate::domain::user::UserDraft;
use crate::domain::{ApiResult, EmailAddress, Error, User, UserId};

use super::principal::CurrentUser;
use super::schemas::PageBody;
use super::state::HttpState;
use super::validation::{FieldName, field_error, invalid_payload, lenient_uuid, page_request};

/// Account details returned to clients. Never includes the password hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    pub name: String,
    #[schema(value_type = String, example = "ada@shop.test")]
    pub email: EmailAddress,
    pub role: String,
    pub group_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            group_id: user.group_id,
            location_id: user.location_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Create or replace an account. `password` is optional on update.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Option<String>,
    /// Unknown or malformed ids are ignored.
    pub group_id: Option<String>,
    pub location_id: Option<String>,
}

impl UserRequest {
    fn into_parts(self) -> Result<(UserDraft, Option<String>), Error> {
        let draft = UserDraft::try_new(
            &self.name,
            &self.email,
            self.role.as_deref(),
            lenient_uuid(self.group_id.as_deref()),
            lenient_uuid(self.location_id.as_deref()),
        )
        .map_err(invalid_payload)?;
        Ok((draft, self.password))
    }
}

/// Page selection for list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw)
        .map_err(|err| field_error(FieldName::new("id"), "invalid_uuid", err.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageParams),
    responses(
        (status = 200, description = "Users", body = PageBody<UserBody>),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 401, description = "Unauthorised", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    user: CurrentUser,
    query: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<UserBody>>> {
    let page = page_request(query.page, query.limit)?;
    let users = state.users.list(&user, page).await?;
    Ok(web::Json(users.map(UserBody::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserBody),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserBody>> {
    let id = parse_user_id(&path)?;
    let found = state.users.get(&user, &id).await?;
    Ok(web::Json(found.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "Created", body = UserBody),
        (status = 400, description = "Invalid request or duplicate email", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<UserRequest>,
) -> ApiResult<HttpResponse> {
    let (draft, password) = payload.into_inner().into_parts()?;
    let password = password.ok_or_else(|| {
        field_error(FieldName::new("password"), "empty_password", "password is required")
    })?;
    let created = state.users.create(&user, draft, &password).await?;
    Ok(HttpResponse::Created().json(UserBody::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "Updated", body = UserBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
    payload: web::Json<UserRequest>,
) -> ApiResult<web::Json<UserBody>> {
    let id = parse_user_id(&path)?;
    let (draft, password) = payload.into_inner().into_parts()?;
    let updated = state
        .users
        .update(&user, &id, UserUpdate { draft, password })
        .await?;
    Ok(web::Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Cannot delete yourself", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    state.users.delete(&user, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}
