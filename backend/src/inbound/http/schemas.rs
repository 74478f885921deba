//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic and do not derive `ToSchema`. The
//! wrappers here mirror the serialised shape of the domain types that handlers
//! return directly, registered under the domain path via `#[schema(as = ...)]`.

#![expect(
    dead_code,
    reason = "schema wrappers are only read by utoipa when generating the document"
)]

use rust_decimal::Decimal;
use utoipa::ToSchema;

/// Stable machine-readable error codes.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with the current state, e.g. a locked proposal.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// API error payload.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    #[schema(example = "name must not be empty")]
    message: String,
    #[schema(example = "5f0c8a2e-9d4b-4f6e-8a1c-3b2d7e9f0a11")]
    trace_id: Option<String>,
    /// Field-level context such as `{"field": "email", "code": "invalid_email"}`.
    details: Option<serde_json::Value>,
}

/// Pagination metadata.
#[derive(ToSchema)]
#[schema(as = pagination::PageInfo, rename_all = "camelCase")]
pub struct PageInfoSchema {
    current_page: u32,
    total_pages: u32,
    total_items: u64,
    items_per_page: u32,
}

/// One page of results.
#[derive(ToSchema)]
pub struct PageBody<T> {
    items: Vec<T>,
    pagination: PageInfoSchema,
}

/// Priced catalog line.
#[derive(ToSchema)]
#[schema(as = crate::domain::pricing::LineBreakdown, rename_all = "camelCase")]
pub struct LineBreakdownSchema {
    unit_price: Decimal,
    assembly_fee: Decimal,
    quantity: u32,
    total: Decimal,
}

/// Full quote breakdown. Amounts are decimal strings rounded to cents.
#[derive(ToSchema)]
#[schema(as = crate::domain::pricing::Quote, rename_all = "camelCase")]
pub struct QuoteSchema {
    lines: Vec<LineBreakdownSchema>,
    cabinet_parts: Decimal,
    assembly_fees: Decimal,
    custom_items: Decimal,
    modifications: Decimal,
    style_total: Decimal,
    discount: Decimal,
    after_discount: Decimal,
    tax: Decimal,
    grand_total: Decimal,
}

/// Quote totals re-priced for another style.
#[derive(ToSchema)]
#[schema(as = crate::domain::pricing::StyleComparison, rename_all = "camelCase")]
pub struct StyleComparisonSchema {
    delta: Decimal,
    style_total: Decimal,
    discount: Decimal,
    after_discount: Decimal,
    tax: Decimal,
    grand_total: Decimal,
}

/// Headline dashboard counters.
#[derive(ToSchema)]
#[schema(as = crate::domain::dashboard::Counts, rename_all = "camelCase")]
pub struct CountsSchema {
    active_proposals: u64,
    active_orders: u64,
}

/// Dashboard overview.
#[derive(ToSchema)]
#[schema(as = crate::domain::dashboard::DashboardSummary)]
pub struct DashboardSummarySchema {
    counts: CountsSchema,
    /// `{id, value, delta}` entries.
    #[schema(value_type = Vec<Object>)]
    metrics: Vec<serde_json::Value>,
    /// `{id, name, stage, value, updatedAt}` entries.
    #[schema(value_type = Vec<Object>)]
    pipeline: Vec<serde_json::Value>,
    /// `{proposalId, title, dueOn, priority}` entries.
    #[schema(value_type = Vec<Object>)]
    tasks: Vec<serde_json::Value>,
}

/// Outcome of a catalog import.
#[derive(ToSchema)]
#[schema(as = crate::domain::catalog::ImportSummary)]
pub struct ImportSummarySchema {
    created: u64,
    updated: u64,
}
