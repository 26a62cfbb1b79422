//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::domain::{DnsVerifier, ProvisionerClient};
use crate::routing::{HostResolver, TenantLookup};

/// State shared by all request handlers.
///
/// Stateless beyond the pooled connections and the resolvers; per-request
/// tenant context lives in a request extension, never here.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub hosts: HostResolver,
    pub tenants: TenantLookup,
    pub dns: DnsVerifier,
    pub provisioner: Option<ProvisionerClient>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let hosts = HostResolver::new(
            config
                .base_domains()
                .iter()
                .map(|d| d.to_string())
                .collect(),
            config.local_subdomain.clone(),
            config.debug,
        );
        let tenants = TenantLookup::new(pool.clone(), &config);
        let dns = DnsVerifier::new(config.dns_query_timeout, config.dns_total_timeout);
        let provisioner = ProvisionerClient::from_config(config.provisioner_url.clone());

        Self {
            config: Arc::new(config),
            pool,
            hosts,
            tenants,
            dns,
            provisioner,
        }
    }
}
