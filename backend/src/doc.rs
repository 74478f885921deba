//! OpenAPI documentation for the showroom API.
//!
//! [`ApiDoc`] lists every HTTP handler plus the shared error and pagination
//! schemas. Request and response bodies referenced by the handlers are
//! collected from their `utoipa::path` annotations. Swagger UI serves the
//! document in debug builds and `openapi-dump` prints it for tooling.

use crate::inbound::http::schemas::{
    CountsSchema, DashboardSummarySchema, ErrorCodeSchema, ErrorSchema, ImportSummarySchema,
    LineBreakdownSchema, PageInfoSchema, QuoteSchema, StyleComparisonSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Cabinet showroom API",
        description = "Catalog pricing, proposals, orders and payments for cabinet showrooms."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::signup,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::me,
        crate::inbound::http::auth::update_profile,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::groups::list_groups,
        crate::inbound::http::groups::get_group,
        crate::inbound::http::groups::create_group,
        crate::inbound::http::groups::update_group,
        crate::inbound::http::groups::delete_group,
        crate::inbound::http::groups::set_multiplier,
        crate::inbound::http::groups::list_contractors,
        crate::inbound::http::groups::get_contractor,
        crate::inbound::http::catalog::list_manufacturers,
        crate::inbound::http::catalog::get_manufacturer,
        crate::inbound::http::catalog::create_manufacturer,
        crate::inbound::http::catalog::update_manufacturer,
        crate::inbound::http::catalog::set_manufacturer_status,
        crate::inbound::http::catalog::list_items,
        crate::inbound::http::catalog::create_item,
        crate::inbound::http::catalog::update_item,
        crate::inbound::http::catalog::import_items,
        crate::inbound::http::catalog::list_styles,
        crate::inbound::http::catalog::get_assembly_cost,
        crate::inbound::http::catalog::set_assembly_cost,
        crate::inbound::http::modifications::list_categories,
        crate::inbound::http::modifications::create_category,
        crate::inbound::http::modifications::update_category,
        crate::inbound::http::modifications::delete_category,
        crate::inbound::http::modifications::list_templates,
        crate::inbound::http::modifications::create_template,
        crate::inbound::http::modifications::update_template,
        crate::inbound::http::modifications::delete_template,
        crate::inbound::http::modifications::use_blueprint,
        crate::inbound::http::modifications::list_assignments,
        crate::inbound::http::modifications::create_assignment,
        crate::inbound::http::modifications::delete_assignment,
        crate::inbound::http::modifications::item_modifications,
        crate::inbound::http::pricing::quote,
        crate::inbound::http::pricing::compare_style,
        crate::inbound::http::customers::list_customers,
        crate::inbound::http::customers::get_customer,
        crate::inbound::http::customers::create_customer,
        crate::inbound::http::customers::update_customer,
        crate::inbound::http::customers::delete_customer,
        crate::inbound::http::settings::list_locations,
        crate::inbound::http::settings::get_location,
        crate::inbound::http::settings::create_location,
        crate::inbound::http::settings::update_location,
        crate::inbound::http::settings::delete_location,
        crate::inbound::http::settings::list_taxes,
        crate::inbound::http::settings::create_tax,
        crate::inbound::http::settings::delete_tax,
        crate::inbound::http::settings::set_default_tax,
        crate::inbound::http::proposals::list_proposals,
        crate::inbound::http::proposals::get_proposal,
        crate::inbound::http::proposals::create_proposal,
        crate::inbound::http::proposals::update_proposal,
        crate::inbound::http::proposals::delete_proposal,
        crate::inbound::http::proposals::reject_proposal,
        crate::inbound::http::proposals::accept_proposal,
        crate::inbound::http::proposals::share_proposal,
        crate::inbound::http::public::get_shared_proposal,
        crate::inbound::http::public::accept_shared_proposal,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::payments::payment_webhook,
        crate::inbound::http::payments::list_payments,
        crate::inbound::http::payments::get_payment,
        crate::inbound::http::payments::create_payment,
        crate::inbound::http::payments::update_payment_status,
        crate::inbound::http::payments::apply_payment,
        crate::inbound::http::payments::delete_payment,
        crate::inbound::http::dashboard::counts,
        crate::inbound::http::dashboard::latest_proposals,
        crate::inbound::http::dashboard::summary,
        crate::inbound::http::resources::list_links,
        crate::inbound::http::resources::create_link,
        crate::inbound::http::resources::update_link,
        crate::inbound::http::resources::delete_link,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        PageInfoSchema,
        QuoteSchema,
        LineBreakdownSchema,
        StyleComparisonSchema,
        CountsSchema,
        DashboardSummarySchema,
        ImportSummarySchema,
    )),
    tags(
        (name = "auth", description = "Login, signup and the current session"),
        (name = "users", description = "Staff accounts"),
        (name = "user-groups", description = "Dealer and contractor groups"),
        (name = "manufacturers", description = "Manufacturers and their pricing factors"),
        (name = "catalog", description = "Catalog items, imports and assembly fees"),
        (name = "modifications", description = "Modification gallery, templates and assignments"),
        (name = "pricing", description = "Quotes and style comparisons"),
        (name = "customers", description = "Customer records"),
        (name = "settings", description = "Locations and tax rates"),
        (name = "proposals", description = "Proposal lifecycle and sharing"),
        (name = "public", description = "Token-authenticated customer access"),
        (name = "orders", description = "Orders created from accepted proposals"),
        (name = "payments", description = "Payments and gateway callbacks"),
        (name = "dashboard", description = "Pipeline counts and summaries"),
        (name = "resources", description = "Shared resource links"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
