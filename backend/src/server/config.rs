//! Application settings loaded via OrthoConfig and the server configuration
//! built from them.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;

use cabinet_backend::domain::services::NumberingConfig;
use cabinet_backend::domain::share::ShareTtl;
use cabinet_backend::inbound::http::state::HttpStateOptions;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;

/// Runtime settings, read from `CABINET_*` variables, config files and flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CABINET")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_size: Option<u32>,
    /// Apply pending migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
    /// Allow self-service signup.
    #[ortho_config(default = true)]
    pub signup_enabled: bool,
    /// Lifetime of proposal share links in minutes.
    pub share_ttl_minutes: Option<i64>,
    pub order_prefix: Option<String>,
    pub proposal_prefix: Option<String>,
    /// Shared secret required on payment gateway callbacks.
    pub webhook_secret: Option<String>,
}

/// Raised when settings cannot be turned into a runnable configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

impl AppSettings {
    /// Parsed listen address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size.filter(|size| *size > 0).unwrap_or(DEFAULT_POOL_SIZE)
    }

    /// Document number prefixes, falling back to `NJ` and `NJQ`.
    pub fn numbering(&self) -> NumberingConfig {
        let defaults = NumberingConfig::default();
        NumberingConfig {
            order_prefix: self.order_prefix.clone().unwrap_or(defaults.order_prefix),
            proposal_prefix: self
                .proposal_prefix
                .clone()
                .unwrap_or(defaults.proposal_prefix),
        }
    }

    /// Switches handed to the HTTP services.
    pub fn http_options(&self) -> HttpStateOptions {
        HttpStateOptions {
            signup_enabled: self.signup_enabled,
            share_ttl: self
                .share_ttl_minutes
                .map(ShareTtl::from_minutes)
                .unwrap_or_default(),
            numbering: self.numbering(),
            webhook_secret: self
                .webhook_secret
                .clone()
                .filter(|secret| !secret.trim().is_empty()),
        }
    }
}

/// Everything needed to start the HTTP listener.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<actix_web_prom::PrometheusMetrics>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<actix_web_prom::PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
