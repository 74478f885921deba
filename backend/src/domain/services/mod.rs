//! Use cases driven by the HTTP layer.
//!
//! Each service owns the ports it needs as trait objects and a
//! [`mockable::Clock`]. Permission checks happen here, against the
//! [`Principal`](crate::domain::Principal) passed in by the caller, so every
//! inbound adapter gets the same rules.

mod auth;
mod catalog;
mod customers;
mod dashboard;
mod groups;
mod modifications;
mod orders;
mod payments;
mod pricing;
mod proposals;
mod resources;
mod settings;
mod users;

pub use auth::{AuthService, ProfileUpdate};
pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use dashboard::DashboardService;
pub use groups::GroupService;
pub use modifications::{BlueprintCopy, ItemModification, ModificationService};
pub use orders::{BackfillOptions, BackfillReport, OrderService};
pub use payments::PaymentService;
pub use pricing::{ModificationLineRequest, PricingService, QuoteLineRequest, QuoteRequest};
pub use proposals::{NumberingConfig, ProposalPorts, ProposalService, SharedProposal};
pub use resources::ResourceService;
pub use settings::SettingsService;
pub use users::{UserService, UserUpdate};

use crate::domain::Error;

/// Attempts made when a freshly allocated document number collides.
pub const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Map a domain validation failure onto a 400.
pub(crate) fn invalid(error: impl std::fmt::Display) -> Error {
    Error::invalid_request(error.to_string())
}

/// Unwrap a lookup or fail with `not_found`.
pub(crate) fn found<T>(value: Option<T>, resource: &str) -> Result<T, Error> {
    value.ok_or_else(|| Error::not_found(format!("{resource} not found")))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared clock for service tests.
    use std::sync::Arc;

    use chrono::{DateTime, Local, TimeZone, Utc};
    use mockable::Clock;

    pub(crate) struct FixtureClock(pub DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    pub(crate) fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 14, 30, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    pub(crate) fn clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock(fixed_now()))
    }
}
