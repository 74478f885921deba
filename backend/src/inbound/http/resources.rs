//! Resource link handlers.
//!
//! ```text
//! POST /api/v1/resources/links {"title":"Oakline catalog","url":"oakline.example/catalog.pdf","type":"catalog"}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::resources::{ResourceLink, ResourceLinkDraft};
use crate::domain::{ApiResult, Error};

use super::principal::CurrentUser;
use super::state::HttpState;
use super::validation::invalid_payload;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkBody {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResourceLink> for LinkBody {
    fn from(link: ResourceLink) -> Self {
        Self {
            id: link.id,
            title: link.title,
            url: link.url,
            kind: link.kind,
            description: link.description,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// Link fields. A URL without a scheme is read as `https://`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LinkRequest {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

impl TryFrom<LinkRequest> for ResourceLinkDraft {
    type Error = Error;

    fn try_from(r: LinkRequest) -> Result<Self, Self::Error> {
        ResourceLinkDraft::try_new(&r.title, &r.url, &r.kind, r.description.as_deref())
            .map_err(invalid_payload)
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/resources/links",
    responses(
        (status = 200, description = "Links", body = [LinkBody]),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "listResourceLinks"
)]
#[get("/resources/links")]
pub async fn list_links(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> ApiResult<web::Json<Vec<LinkBody>>> {
    let links = state.resources.list(&user).await?;
    Ok(web::Json(links.into_iter().map(LinkBody::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/resources/links",
    request_body = LinkRequest,
    responses(
        (status = 201, description = "Created", body = LinkBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "createResourceLink"
)]
#[post("/resources/links")]
pub async fn create_link(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<LinkRequest>,
) -> ApiResult<HttpResponse> {
    let draft = ResourceLinkDraft::try_from(payload.into_inner())?;
    let link = state.resources.create(&user, draft).await?;
    Ok(HttpResponse::Created().json(LinkBody::from(link)))
}

#[utoipa::path(
    put,
    path = "/api/v1/resources/links/{id}",
    params(("id" = Uuid, Path, description = "Link id")),
    request_body = LinkRequest,
    responses(
        (status = 200, description = "Updated", body = LinkBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "updateResourceLink"
)]
#[put("/resources/links/{id}")]
pub async fn update_link(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<LinkRequest>,
) -> ApiResult<web::Json<LinkBody>> {
    let draft = ResourceLinkDraft::try_from(payload.into_inner())?;
    let link = state
        .resources
        .update(&user, path.into_inner(), draft)
        .await?;
    Ok(web::Json(link.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/resources/links/{id}",
    params(("id" = Uuid, Path, description = "Link id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "deleteResourceLink"
)]
#[delete("/resources/links/{id}")]
pub async fn delete_link(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.resources.delete(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
