//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every handler is registered through [`configure`] so the server and the
//! handler tests share one route table.

use actix_web::web;

pub mod auth;
pub mod catalog;
pub mod customers;
pub mod dashboard;
pub mod error;
pub mod groups;
pub mod health;
pub mod modifications;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod principal;
pub mod proposals;
pub mod public;
pub mod resources;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod settings;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register the `/api/v1` routes and payload error handlers.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use cabinet_backend::inbound::http::configure;
///
/// let _app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(
            web::scope("/api/v1")
                .service(auth::login)
                .service(auth::signup)
                .service(auth::logout)
                .service(auth::me)
                .service(auth::update_profile)
                .service(users::list_users)
                .service(users::get_user)
                .service(users::create_user)
                .service(users::update_user)
                .service(users::delete_user)
                .service(groups::list_groups)
                .service(groups::get_group)
                .service(groups::create_group)
                .service(groups::update_group)
                .service(groups::delete_group)
                .service(groups::set_multiplier)
                .service(groups::list_contractors)
                .service(groups::get_contractor)
                .service(catalog::list_manufacturers)
                .service(catalog::get_manufacturer)
                .service(catalog::create_manufacturer)
                .service(catalog::update_manufacturer)
                .service(catalog::set_manufacturer_status)
                .service(catalog::list_items)
                .service(catalog::create_item)
                .service(catalog::update_item)
                .service(catalog::import_items)
                .service(catalog::list_styles)
                .service(catalog::get_assembly_cost)
                .service(catalog::set_assembly_cost)
                .service(modifications::list_categories)
                .service(modifications::create_category)
                .service(modifications::update_category)
                .service(modifications::delete_category)
                .service(modifications::list_templates)
                .service(modifications::create_template)
                .service(modifications::update_template)
                .service(modifications::delete_template)
                .service(modifications::use_blueprint)
                .service(modifications::list_assignments)
                .service(modifications::create_assignment)
                .service(modifications::delete_assignment)
                .service(modifications::item_modifications)
                .service(pricing::quote)
                .service(pricing::compare_style)
                .service(customers::list_customers)
                .service(customers::get_customer)
                .service(customers::create_customer)
                .service(customers::update_customer)
                .service(customers::delete_customer)
                .service(settings::list_locations)
                .service(settings::get_location)
                .service(settings::create_location)
                .service(settings::update_location)
                .service(settings::delete_location)
                .service(settings::list_taxes)
                .service(settings::create_tax)
                .service(settings::delete_tax)
                .service(settings::set_default_tax)
                .service(proposals::list_proposals)
                .service(proposals::get_proposal)
                .service(proposals::create_proposal)
                .service(proposals::update_proposal)
                .service(proposals::delete_proposal)
                .service(proposals::reject_proposal)
                .service(proposals::accept_proposal)
                .service(proposals::share_proposal)
                .service(public::get_shared_proposal)
                .service(public::accept_shared_proposal)
                .service(orders::list_orders)
                .service(orders::get_order)
                .service(payments::payment_webhook)
                .service(payments::list_payments)
                .service(payments::get_payment)
                .service(payments::create_payment)
                .service(payments::update_payment_status)
                .service(payments::apply_payment)
                .service(payments::delete_payment)
                .service(dashboard::counts)
                .service(dashboard::latest_proposals)
                .service(dashboard::summary)
                .service(resources::list_links)
                .service(resources::create_link)
                .service(resources::update_link)
                .service(resources::delete_link),
        );
}
