//! Location and tax rate settings.
//!
//! ```text
//! GET    /api/v1/locations
//! POST   /api/v1/locations {"name":"Showroom","timeZone":"America/New_York"}
//! POST   /api/v1/taxes {"label":"NJ","value":"6.625"}
//! PUT    /api/v1/taxes/{id}/default
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::settings::{Location, LocationDraft, Tax, TaxDraft};
use crate::domain::{ApiResult, Error};

use super::principal::CurrentUser;
use super::state::HttpState;
use super::validation::invalid_payload;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationBody {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub time_zone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Location> for LocationBody {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
            address: location.address,
            email: location.email,
            phone: location.phone,
            website: location.website,
            time_zone: location.time_zone,
            created_at: location.created_at,
            updated_at: location.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// IANA zone name.
    pub time_zone: Option<String>,
}

impl TryFrom<LocationRequest> for LocationDraft {
    type Error = Error;

    fn try_from(r: LocationRequest) -> Result<Self, Self::Error> {
        LocationDraft::try_new(&r.name, r.address, r.email, r.phone, r.website, r.time_zone)
            .map_err(invalid_payload)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxBody {
    pub id: Uuid,
    pub label: String,
    #[schema(value_type = String, example = "6.625")]
    pub value: Decimal,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Tax> for TaxBody {
    fn from(tax: Tax) -> Self {
        Self {
            id: tax.id,
            label: tax.label,
            value: tax.value,
            is_default: tax.is_default,
            created_at: tax.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TaxRequest {
    pub label: String,
    /// Percentage between 0 and 100.
    #[schema(value_type = String, example = "6.625")]
    pub value: Decimal,
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses(
        (status = 200, description = "Locations", body = [LocationBody]),
        (status = 401, description = "Unauthorised", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "listLocations"
)]
#[get("/locations")]
pub async fn list_locations(
    state: web::Data<HttpState>,
    _user: CurrentUser,
) -> ApiResult<web::Json<Vec<LocationBody>>> {
    let locations = state.settings.locations().await?;
    Ok(web::Json(
        locations.into_iter().map(LocationBody::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location", body = LocationBody),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "getLocation"
)]
#[get("/locations/{id}")]
pub async fn get_location(
    state: web::Data<HttpState>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<LocationBody>> {
    let location = state.settings.location(path.into_inner()).await?;
    Ok(web::Json(location.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = LocationRequest,
    responses(
        (status = 201, description = "Created", body = LocationBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "createLocation"
)]
#[post("/locations")]
pub async fn create_location(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<LocationRequest>,
) -> ApiResult<HttpResponse> {
    let draft = LocationDraft::try_from(payload.into_inner())?;
    let location = state.settings.create_location(&user, draft).await?;
    Ok(HttpResponse::Created().json(LocationBody::from(location)))
}

#[utoipa::path(
    put,
    path = "/api/v1/locations/{id}",
    params(("id" = Uuid, Path, description = "Location id")),
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Updated", body = LocationBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "updateLocation"
)]
#[put("/locations/{id}")]
pub async fn update_location(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    payload: web::Json<LocationRequest>,
) -> ApiResult<web::Json<LocationBody>> {
    let draft = LocationDraft::try_from(payload.into_inner())?;
    let location = state
        .settings
        .update_location(&user, path.into_inner(), draft)
        .await?;
    Ok(web::Json(location.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "deleteLocation"
)]
#[delete("/locations/{id}")]
pub async fn delete_location(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .settings
        .delete_location(&user, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/taxes",
    responses(
        (status = 200, description = "Tax rates", body = [TaxBody]),
        (status = 401, description = "Unauthorised", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "listTaxes"
)]
#[get("/taxes")]
pub async fn list_taxes(
    state: web::Data<HttpState>,
    _user: CurrentUser,
) -> ApiResult<web::Json<Vec<TaxBody>>> {
    let taxes = state.settings.taxes().await?;
    Ok(web::Json(taxes.into_iter().map(TaxBody::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/taxes",
    request_body = TaxRequest,
    responses(
        (status = 201, description = "Created; the first rate becomes the default", body = TaxBody),
        (status = 400, description = "Invalid request", body = super::schemas::ErrorSchema),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "createTax"
)]
#[post("/taxes")]
pub async fn create_tax(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<TaxRequest>,
) -> ApiResult<HttpResponse> {
    let TaxRequest { label, value } = payload.into_inner();
    let draft = TaxDraft::try_new(&label, value).map_err(invalid_payload)?;
    let tax = state.settings.create_tax(&user, draft).await?;
    Ok(HttpResponse::Created().json(TaxBody::from(tax)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/taxes/{id}",
    params(("id" = Uuid, Path, description = "Tax id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "deleteTax"
)]
#[delete("/taxes/{id}")]
pub async fn delete_tax(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.settings.delete_tax(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    path = "/api/v1/taxes/{id}/default",
    params(("id" = Uuid, Path, description = "Tax id")),
    responses(
        (status = 204, description = "Default changed"),
        (status = 403, description = "Forbidden", body = super::schemas::ErrorSchema),
        (status = 404, description = "Not found", body = super::schemas::ErrorSchema)
    ),
    tags = ["settings"],
    operation_id = "setDefaultTax"
)]
#[put("/taxes/{id}/default")]
pub async fn set_default_tax(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .settings
        .set_default_tax(&user, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{ADMIN_EMAIL, TestBackend, call_as, json_body, login};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn default_label(taxes: &Value) -> Vec<&str> {
        taxes
            .as_array()
            .expect("array")
            .iter()
            .filter(|tax| tax["isDefault"] == json!(true))
            .filter_map(|tax| tax["label"].as_str())
            .collect()
    }

    #[actix_web::test]
    async fn first_tax_is_default_until_another_is_chosen() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let nj = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post()
                .uri("/api/v1/taxes")
                .set_json(json!({ "label": "NJ", "value": "6.625" })),
        )
        .await;
        assert_eq!(nj.status(), StatusCode::CREATED);
        assert_eq!(json_body(nj).await["isDefault"], json!(true));
        let ny = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post()
                .uri("/api/v1/taxes")
                .set_json(json!({ "label": "NY", "value": "8.875" })),
        )
        .await;
        let ny_body = json_body(ny).await;
        assert_eq!(ny_body["isDefault"], json!(false));
        let ny_id = ny_body["id"].as_str().expect("id").to_owned();

        let res = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::put().uri(&format!("/api/v1/taxes/{ny_id}/default")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let taxes = json_body(
            call_as(&app, &cookie, actix_test::TestRequest::get().uri("/api/v1/taxes")).await,
        )
        .await;
        assert_eq!(default_label(&taxes), vec!["NY"]);
    }

    #[rstest]
    #[case(json!({ "label": "", "value": "5" }))]
    #[case(json!({ "label": "Over", "value": "101" }))]
    #[case(json!({ "label": "Neg", "value": "-1" }))]
    #[actix_web::test]
    async fn invalid_taxes_are_rejected(#[case] payload: Value) {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let res = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post()
                .uri("/api/v1/taxes")
                .set_json(payload),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_tax_cannot_become_default() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let res = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/taxes/{}/default", Uuid::new_v4())),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn locations_round_trip_and_trim_blank_fields() {
        let backend = TestBackend::new().await;
        let app = actix_test::init_service(backend.app()).await;
        let cookie = login(&app, ADMIN_EMAIL).await;

        let created = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::post().uri("/api/v1/locations").set_json(json!({
                "name": " Showroom ",
                "phone": "  ",
                "timeZone": "America/New_York"
            })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let body = json_body(created).await;
        assert_eq!(body["name"], "Showroom");
        assert_eq!(body["phone"], Value::Null);
        let id = body["id"].as_str().expect("id").to_owned();

        let res = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::delete().uri(&format!("/api/v1/locations/{id}")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let gone = call_as(
            &app,
            &cookie,
            actix_test::TestRequest::get().uri(&format!("/api/v1/locations/{id}")),
        )
        .await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn staff_can_read_but_not_change_settings() {
        let backend = TestBackend::new().await;
        backend.seed_user("staff@shop.test", "User", None).await;
        let app = actix_test::init_service(backend.app()).await;
        let staff = login(&app, "staff@shop.test").await;

        let listed = call_as(&app, &staff, actix_test::TestRequest::get().uri("/api/v1/taxes")).await;
        assert_eq!(listed.status(), StatusCode::OK);
        let res = call_as(
            &app,
            &staff,
            actix_test::TestRequest::post()
                .uri("/api/v1/locations")
                .set_json(json!({ "name": "Annex" })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
