//! Quote pricing handlers.
//!
//! ```text
//! POST /api/v1/pricing/quote {"manufacturerId":"…","lines":[{"catalogItemId":"…","quantity":2,"includeAssembly":true}],"discountPercent":"5"}
//! POST /api/v1/pricing/quote {…, "modifications":[{"templateId":"…","catalogItemId":"…","quantity":1}]}
//! POST /api/v1/pricing/compare-style {…, "style":"Slab"}
//! ```

use actix_web::{post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::pricing::{PricedExtra, Quote, StyleComparison};
use crate::domain::services::{ModificationLineRequest, QuoteLineRequest, QuoteRequest};
use crate::domain::ApiResult;

use super::principal::CurrentUser;
use super::state::HttpState;
use super::validation::{FieldName, field_error};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineBody {
    pub catalog_item_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub include_assembly: bool,
}

/// Free-form priced row.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ExtraBody {
    #[schema(value_type = String, example = "45.00")]
    pub price: Decimal,
    pub quantity: u32,
}

/// Modification template on a quote, optionally tied to a quoted item.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModificationLineBody {
    pub template_id: Uuid,
    #[serde(default)]
    pub catalog_item_id: Option<Uuid>,
    pub quantity: u32,
}

/// Quote request. Prices are looked up server-side from the catalog.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBody {
    pub manufacturer_id: Uuid,
    #[serde(default)]
    pub lines: Vec<QuoteLineBody>,
    #[serde(default)]
    pub custom_items: Vec<ExtraBody>,
    #[serde(default)]
    pub modifications: Vec<ModificationLineBody>,
    #[serde(default)]
    #[schema(value_type = String, example = "5")]
    pub discount_percent: Decimal,
    /// Defaults to the configured default tax rate.
    #[schema(value_type = Option<String>, example = "8.25")]
    pub tax_percent: Option<Decimal>,
}

impl From<QuoteBody> for QuoteRequest {
    fn from(body: QuoteBody) -> Self {
        Self {
            manufacturer_id: body.manufacturer_id,
            lines: body
                .lines
                .into_iter()
                .map(|line| QuoteLineRequest {
                    catalog_item_id: line.catalog_item_id,
                    quantity: line.quantity,
                    include_assembly: line.include_assembly,
                })
                .collect(),
            custom_items: body
                .custom_items
                .into_iter()
                .map(|row| PricedExtra {
                    price: row.price,
                    quantity: row.quantity,
                })
                .collect(),
            modifications: body
                .modifications
                .into_iter()
                .map(|row| ModificationLineRequest {
                    template_id: row.template_id,
                    catalog_item_id: row.catalog_item_id,
                    quantity: row.quantity,
                })
                .collect(),
            discount_percent: body.discount_percent,
            tax_percent: body.tax_percent,
        }
    }
}

/// Quote request plus the style to compare against.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CompareStyleBody {
    #[serde(flatten)]
    pub quote: QuoteBody,
    pub style: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/pricing/quote",
    request_body = QuoteBody,
    responses(
        (status = 200, description = "Priced quote", body = super::schemas::QuoteSchema),
        (status = 400, description = "Invalid quantities, percentages or items", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["pricing"],
    operation_id = "quote"
)]
#[post("/pricing/quote")]
pub async fn quote(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<QuoteBody>,
) -> ApiResult<web::Json<Quote>> {
    let request = QuoteRequest::from(payload.into_inner());
    Ok(web::Json(state.pricing.quote(&user, &request).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/pricing/compare-style",
    request_body = CompareStyleBody,
    responses(
        (status = 200, description = "Totals in the alternative style", body = super::schemas::StyleComparisonSchema),
        (status = 400, description = "Item not offered in the style", body = super::schemas::ErrorSchema),
        (status = 404, description = "Unknown manufacturer", body = super::schemas::ErrorSchema)
    ),
    tags = ["pricing"],
    operation_id = "compareStyle"
)]
#[post("/pricing/compare-style")]
pub async fn compare_style(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Json<CompareStyleBody>,
) -> ApiResult<web::Json<StyleComparison>> {
    let CompareStyleBody { quote: body, style } = payload.into_inner();
    let style = style.trim();
    if style.is_empty() {
        return Err(field_error(
            FieldName::new("style"),
            "empty_style",
            "style must not be empty",
        ));
    }
    let request = QuoteRequest::from(body);
    let comparison = state.pricing.compare_style(&user, &request, style).await?;
    Ok(web::Json(comparison))
}
