//! Builders for the HTTP state: Diesel adapters when a database is
//! configured, the in-memory store otherwise.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use cabinet_backend::inbound::http::state::{HttpState, HttpStateOptions, HttpStatePorts};
use cabinet_backend::outbound::memory::MemoryStore;
use cabinet_backend::outbound::persistence::{
    DbPool, DieselCatalogRepository, DieselCustomerRepository, DieselLocationRepository,
    DieselManufacturerRepository, DieselModificationRepository, DieselOrderRepository, DieselPaymentRepository,
    DieselProposalRepository, DieselResourceRepository, DieselTaxRepository,
    DieselUserGroupRepository, DieselUserRepository, PoolConfig, PoolError,
    run_pending_migrations,
};

use super::config::AppSettings;

/// Wire every port to a Diesel adapter sharing `pool`.
fn diesel_ports(pool: &DbPool, clock: Arc<dyn Clock>) -> HttpStatePorts {
    HttpStatePorts {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        groups: Arc::new(DieselUserGroupRepository::new(pool.clone())),
        manufacturers: Arc::new(DieselManufacturerRepository::new(pool.clone())),
        catalog: Arc::new(DieselCatalogRepository::new(pool.clone())),
        modifications: Arc::new(DieselModificationRepository::new(pool.clone())),
        customers: Arc::new(DieselCustomerRepository::new(pool.clone())),
        locations: Arc::new(DieselLocationRepository::new(pool.clone())),
        taxes: Arc::new(DieselTaxRepository::new(pool.clone())),
        proposals: Arc::new(DieselProposalRepository::new(pool.clone())),
        orders: Arc::new(DieselOrderRepository::new(pool.clone())),
        payments: Arc::new(DieselPaymentRepository::new(pool.clone())),
        resources: Arc::new(DieselResourceRepository::new(pool.clone())),
        clock,
    }
}

/// Apply migrations on a blocking thread, then open the pool.
async fn connect(settings: &AppSettings, url: &str) -> Result<DbPool, PoolError> {
    if settings.run_migrations {
        let migration_url = url.to_owned();
        let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
            .await
            .map_err(|err| PoolError::build(format!("migration task failed: {err}")))??;
        info!(applied, "database schema up to date");
    }
    DbPool::new(PoolConfig::new(url).with_max_size(settings.pool_size())).await
}

/// Build the handler state for the configured storage backend.
///
/// # Errors
/// Returns [`PoolError`] when migrations fail or the pool cannot be built.
pub(crate) async fn build_http_state(
    settings: &AppSettings,
) -> Result<web::Data<HttpState>, PoolError> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let options: HttpStateOptions = settings.http_options();
    let ports = match settings.database_url.as_deref() {
        Some(url) => {
            let pool = connect(settings, url).await?;
            info!(pool_size = settings.pool_size(), "using PostgreSQL persistence");
            diesel_ports(&pool, clock)
        }
        None => {
            warn!("CABINET_DATABASE_URL not set; data lives in memory and is lost on exit");
            HttpStatePorts::from_store(Arc::new(MemoryStore::new()), clock)
        }
    };
    if options.webhook_secret.is_none() {
        warn!("payment webhook disabled; set CABINET_WEBHOOK_SECRET to enable it");
    }
    Ok(web::Data::new(HttpState::new(ports, options)))
}
