//! Shared HTTP adapter state.
//!
//! Handlers receive [`HttpState`] through `web::Data` and only talk to domain
//! services, so they stay testable against the in-memory adapters.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    CatalogRepository, CustomerRepository, LocationRepository, ManufacturerRepository,
    ModificationRepository, OrderRepository, PaymentRepository, ProposalRepository, ResourceRepository, TaxRepository,
    UserGroupRepository, UserRepository,
};
use crate::domain::services::{
    AuthService, CatalogService, CustomerService, DashboardService, GroupService,
    ModificationService, NumberingConfig, OrderService, PaymentService, PricingService, ProposalPorts,
    ProposalService, ResourceService, SettingsService, UserService,
};
use crate::domain::share::ShareTtl;

/// Parameter object bundling every repository port plus the clock.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn UserGroupRepository>,
    pub manufacturers: Arc<dyn ManufacturerRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub modifications: Arc<dyn ModificationRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub taxes: Arc<dyn TaxRepository>,
    pub proposals: Arc<dyn ProposalRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub resources: Arc<dyn ResourceRepository>,
    pub clock: Arc<dyn Clock>,
}

impl HttpStatePorts {
    /// Use one adapter for every port.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use cabinet_backend::inbound::http::state::HttpStatePorts;
    /// use cabinet_backend::outbound::memory::MemoryStore;
    /// use mockable::DefaultClock;
    ///
    /// let ports = HttpStatePorts::from_store(Arc::new(MemoryStore::new()), Arc::new(DefaultClock));
    /// let _users = ports.users.clone();
    /// ```
    pub fn from_store<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: UserRepository
            + UserGroupRepository
            + ManufacturerRepository
            + CatalogRepository
            + ModificationRepository
            + CustomerRepository
            + LocationRepository
            + TaxRepository
            + ProposalRepository
            + OrderRepository
            + PaymentRepository
            + ResourceRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            groups: store.clone(),
            manufacturers: store.clone(),
            catalog: store.clone(),
            modifications: store.clone(),
            customers: store.clone(),
            locations: store.clone(),
            taxes: store.clone(),
            proposals: store.clone(),
            orders: store.clone(),
            payments: store.clone(),
            resources: store,
            clock,
        }
    }
}

/// Runtime switches applied to the services.
#[derive(Debug, Clone)]
pub struct HttpStateOptions {
    pub signup_enabled: bool,
    pub share_ttl: ShareTtl,
    pub numbering: NumberingConfig,
    /// Shared secret the payment gateway must send; `None` disables the
    /// webhook.
    pub webhook_secret: Option<String>,
}

impl Default for HttpStateOptions {
    fn default() -> Self {
        Self {
            signup_enabled: true,
            share_ttl: ShareTtl::default(),
            numbering: NumberingConfig::default(),
            webhook_secret: None,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub users: UserService,
    pub groups: GroupService,
    pub catalog: CatalogService,
    pub modifications: ModificationService,
    pub pricing: PricingService,
    pub customers: CustomerService,
    pub settings: SettingsService,
    pub proposals: ProposalService,
    pub orders: OrderService,
    pub payments: PaymentService,
    pub dashboard: DashboardService,
    pub resources: ResourceService,
    pub webhook_secret: Option<String>,
}

impl HttpState {
    pub fn new(ports: HttpStatePorts, options: HttpStateOptions) -> Self {
        let HttpStatePorts {
            users,
            groups,
            manufacturers,
            catalog,
            modifications,
            customers,
            locations,
            taxes,
            proposals,
            orders,
            payments,
            resources,
            clock,
        } = ports;
        let customer_service = CustomerService::new(customers, clock.clone());
        let proposal_ports = ProposalPorts {
            proposals: proposals.clone(),
            orders: orders.clone(),
            manufacturers: manufacturers.clone(),
            locations: locations.clone(),
            users: users.clone(),
        };
        Self {
            auth: AuthService::new(users.clone(), groups.clone(), clock.clone())
                .with_signup(options.signup_enabled),
            users: UserService::new(users, groups.clone(), clock.clone()),
            groups: GroupService::new(groups, clock.clone()),
            catalog: CatalogService::new(manufacturers.clone(), catalog.clone(), clock.clone()),
            modifications: ModificationService::new(
                modifications.clone(),
                manufacturers.clone(),
                catalog.clone(),
                clock.clone(),
            ),
            pricing: PricingService::new(manufacturers, catalog, modifications, taxes.clone()),
            settings: SettingsService::new(locations, taxes, clock.clone()),
            proposals: ProposalService::new(proposal_ports, customer_service.clone(), clock.clone())
                .with_numbering(options.numbering.clone())
                .with_share_ttl(options.share_ttl),
            orders: OrderService::new(orders.clone(), proposals.clone(), clock.clone())
                .with_numbering(options.numbering),
            payments: PaymentService::new(payments, orders.clone(), clock.clone()),
            dashboard: DashboardService::new(
                proposals,
                orders,
                customer_service.clone(),
                clock.clone(),
            ),
            resources: ResourceService::new(resources, clock),
            customers: customer_service,
            webhook_secret: options.webhook_secret,
        }
    }
}
